//! Equivalence policies used to decide whether two directories are "the same".
//!
//! Each policy projects a directory onto exactly one key. Equality and
//! hashing are both derived from that projection, so entities that compare
//! equal always hash equal.

use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

use rusty_dirmanager_common::KeyHasher;
use serde::{Deserialize, Serialize};

use crate::entity::DirectoryEntity;
use crate::error::FileSystemError;
use crate::provider::DirectoryProvider;

/// The attribute used to compare directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EquivalenceKey {
    /// Case-sensitive leaf name.
    #[default]
    Name,
    /// Case-sensitive absolute path.
    FullName,
    /// Exact creation timestamp.
    DateOfCreation,
    /// Exact aggregate byte count of all descendant files.
    Size,
}

/// A projected key value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyValue {
    Name(String),
    FullName(PathBuf),
    DateOfCreation(SystemTime),
    Size(u64),
}

const TAG_NAME: u8 = 1;
const TAG_FULL_NAME: u8 = 2;
const TAG_CREATED_AFTER_EPOCH: u8 = 3;
const TAG_CREATED_BEFORE_EPOCH: u8 = 4;
const TAG_SIZE: u8 = 5;

impl KeyValue {
    /// Hash of the projected value.
    pub fn digest(&self) -> u64 {
        let mut hasher: KeyHasher = KeyHasher::new();
        match self {
            KeyValue::Name(name) => hasher.write_str(TAG_NAME, name),
            KeyValue::FullName(path) => hasher.write_str(TAG_FULL_NAME, &path.to_string_lossy()),
            KeyValue::DateOfCreation(time) => match time.duration_since(UNIX_EPOCH) {
                Ok(after) => hasher.write_u128(TAG_CREATED_AFTER_EPOCH, after.as_nanos()),
                Err(before) => {
                    hasher.write_u128(TAG_CREATED_BEFORE_EPOCH, before.duration().as_nanos())
                }
            },
            KeyValue::Size(size) => hasher.write_u128(TAG_SIZE, u128::from(*size)),
        };
        hasher.finish()
    }
}

/// Equality and hashing over one projection of a directory.
///
/// Projections may touch the filesystem (`Size` walks the tree), so every
/// operation is fallible and filesystem faults propagate unchanged.
pub trait EquivalencePolicy: Send + Sync {
    /// The key this policy projects onto.
    fn key(&self) -> EquivalenceKey;

    /// Project an entity onto this policy's key.
    ///
    /// # Errors
    /// Returns the filesystem error raised while reading the key.
    fn project(&self, entity: &DirectoryEntity) -> Result<KeyValue, FileSystemError>;

    /// Check whether two entities are equal under this policy.
    ///
    /// # Errors
    /// Returns the filesystem error raised while projecting either side.
    fn equals(&self, a: &DirectoryEntity, b: &DirectoryEntity) -> Result<bool, FileSystemError> {
        Ok(self.project(a)? == self.project(b)?)
    }

    /// Hash an entity under this policy.
    ///
    /// # Errors
    /// Returns the filesystem error raised while projecting the entity.
    fn hash(&self, entity: &DirectoryEntity) -> Result<u64, FileSystemError> {
        Ok(self.project(entity)?.digest())
    }
}

/// Compare by leaf name.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByName;

impl EquivalencePolicy for ByName {
    fn key(&self) -> EquivalenceKey {
        EquivalenceKey::Name
    }

    fn project(&self, entity: &DirectoryEntity) -> Result<KeyValue, FileSystemError> {
        Ok(KeyValue::Name(entity.name().to_string()))
    }
}

/// Compare by absolute path.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByFullName;

impl EquivalencePolicy for ByFullName {
    fn key(&self) -> EquivalenceKey {
        EquivalenceKey::FullName
    }

    fn project(&self, entity: &DirectoryEntity) -> Result<KeyValue, FileSystemError> {
        Ok(KeyValue::FullName(entity.full_path().to_path_buf()))
    }
}

/// Compare by creation timestamp, with no tolerance.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByDateOfCreation;

impl EquivalencePolicy for ByDateOfCreation {
    fn key(&self) -> EquivalenceKey {
        EquivalenceKey::DateOfCreation
    }

    fn project(&self, entity: &DirectoryEntity) -> Result<KeyValue, FileSystemError> {
        Ok(KeyValue::DateOfCreation(entity.creation_time()))
    }
}

/// Compare by aggregate size. Walks the tree on every projection.
pub struct BySize<'a> {
    provider: &'a dyn DirectoryProvider,
}

impl<'a> BySize<'a> {
    /// Create a size policy measuring through `provider`.
    pub fn new(provider: &'a dyn DirectoryProvider) -> Self {
        Self { provider }
    }
}

impl EquivalencePolicy for BySize<'_> {
    fn key(&self) -> EquivalenceKey {
        EquivalenceKey::Size
    }

    fn project(&self, entity: &DirectoryEntity) -> Result<KeyValue, FileSystemError> {
        let size: u64 = self.provider.recursive_aggregate_size(entity.full_path())?;
        Ok(KeyValue::Size(size))
    }
}

/// Build the policy for a key.
///
/// # Arguments
/// * `key` - The attribute to compare by
/// * `provider` - Filesystem used by policies that read the disk
pub fn policy_for<'a>(
    key: EquivalenceKey,
    provider: &'a dyn DirectoryProvider,
) -> Box<dyn EquivalencePolicy + 'a> {
    match key {
        EquivalenceKey::Name => Box::new(ByName),
        EquivalenceKey::FullName => Box::new(ByFullName),
        EquivalenceKey::DateOfCreation => Box::new(ByDateOfCreation),
        EquivalenceKey::Size => Box::new(BySize::new(provider)),
    }
}
