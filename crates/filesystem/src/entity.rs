//! Lightweight directory views.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use rusty_dirmanager_common::{leaf_name, normalize_full_path, parent_of, PathError};

use crate::error::FileSystemError;
use crate::provider::aggregate_size;

/// One directory node, captured as an independent view over a path.
///
/// The entity never holds a reference to its parent or children; both are
/// recomputed from the path on demand. Aggregate size is never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntity {
    /// Leaf segment of `full_path`.
    name: String,
    /// Absolute, normalized path without trailing separator.
    full_path: PathBuf,
    /// Creation timestamp captured when the view was made.
    creation_time: SystemTime,
}

impl DirectoryEntity {
    /// Create a view over an existing directory.
    ///
    /// # Arguments
    /// * `path` - Directory path (relative paths resolve against the current directory)
    ///
    /// # Errors
    /// Returns `NotFound` if the path is missing or is not a directory.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, FileSystemError> {
        let full_path: PathBuf = normalize_full_path(path.as_ref())?;
        let metadata: Metadata = match std::fs::metadata(&full_path) {
            Ok(m) if m.is_dir() => m,
            Ok(_) => return Err(FileSystemError::not_found(&full_path)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileSystemError::not_found(&full_path))
            }
            Err(e) => return Err(FileSystemError::io(&full_path, e)),
        };
        Self::from_metadata(full_path, &metadata)
    }

    /// Create a view from metadata that was already read.
    ///
    /// Hosts that do not record birth time report the last write time
    /// instead, so every entity has a creation timestamp.
    pub(crate) fn from_metadata(
        full_path: PathBuf,
        metadata: &Metadata,
    ) -> Result<Self, FileSystemError> {
        let creation_time: SystemTime = metadata
            .created()
            .or_else(|_| metadata.modified())
            .map_err(|e| FileSystemError::io(&full_path, e))?;
        Self::with_metadata(full_path, creation_time)
    }

    /// Create a view without touching the filesystem.
    ///
    /// Used by providers that are not backed by the local disk.
    ///
    /// # Arguments
    /// * `full_path` - Directory path
    /// * `creation_time` - Creation timestamp to report
    ///
    /// # Errors
    /// Returns a path error if the path has no leaf segment.
    pub fn with_metadata(
        full_path: impl AsRef<Path>,
        creation_time: SystemTime,
    ) -> Result<Self, FileSystemError> {
        let full_path: PathBuf = normalize_full_path(full_path.as_ref())?;
        let name: String = entity_name(&full_path)?;
        Ok(Self {
            name,
            full_path,
            creation_time,
        })
    }

    /// Leaf name of the directory.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Absolute, normalized path of the directory.
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Creation timestamp captured when this view was made.
    pub fn creation_time(&self) -> SystemTime {
        self.creation_time
    }

    /// Check whether the directory still exists on disk.
    pub fn exists(&self) -> bool {
        self.full_path.is_dir()
    }

    /// Look up the parent directory.
    ///
    /// # Errors
    /// Returns a path error for filesystem roots, or `NotFound` if the
    /// parent has vanished.
    pub fn parent(&self) -> Result<DirectoryEntity, FileSystemError> {
        let parent: PathBuf = parent_of(&self.full_path)?;
        Self::from_path(parent)
    }

    /// Sum the sizes of all files below this directory.
    ///
    /// Walks the tree on every call; nothing is cached.
    ///
    /// # Errors
    /// Returns `NotFound` if the directory vanished, or an IO error if part
    /// of the tree cannot be read.
    pub fn compute_aggregate_size(&self) -> Result<u64, FileSystemError> {
        aggregate_size(&self.full_path)
    }

    /// Point this view at the location a rename moved it to.
    pub(crate) fn relocate(&mut self, new_path: PathBuf) -> Result<(), FileSystemError> {
        self.name = entity_name(&new_path)?;
        self.full_path = new_path;
        Ok(())
    }
}

/// Leaf name of an entity path. Names that are not valid UTF-8 are
/// refused: renaming them through a lossy string would change them on disk.
fn entity_name(path: &Path) -> Result<String, FileSystemError> {
    leaf_name(path).map_err(|e| match e {
        PathError::NonUtf8Name { name, .. } => FileSystemError::InvalidName { name },
        other => FileSystemError::Path(other),
    })
}
