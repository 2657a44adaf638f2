//! Set comparison of two directories' immediate children.
//!
//! Comparison is left-oriented: the result is always a subset of the left
//! root's children. `Matching` keeps the left children whose key appears
//! among the right children; `NonMatching` keeps the rest. The two outputs
//! therefore partition the left side under every key.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::entity::DirectoryEntity;
use crate::equivalence::{policy_for, EquivalenceKey, EquivalencePolicy, KeyValue};
use crate::error::FileSystemError;
use crate::provider::{DirectoryProvider, EntityIter, LOCAL_FILE_SYSTEM};

/// Which side of the comparison to return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputSelector {
    /// Left children whose key is present on the right (intersection).
    #[default]
    Matching,
    /// Left children whose key is absent on the right (left except right).
    NonMatching,
}

/// Options for comparing two directories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompareOptions {
    /// Which side of the comparison to return.
    pub output: OutputSelector,
    /// The attribute to compare by.
    pub key: EquivalenceKey,
}

impl CompareOptions {
    /// Set the output selector.
    pub fn with_output(mut self, output: OutputSelector) -> Self {
        self.output = output;
        self
    }

    /// Set the equivalence key.
    pub fn with_key(mut self, key: EquivalenceKey) -> Self {
        self.key = key;
        self
    }
}

/// One comparison, built per call and consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonRequest {
    left_root: PathBuf,
    right_root: PathBuf,
    output: OutputSelector,
    key: EquivalenceKey,
}

impl ComparisonRequest {
    /// Create a comparison request.
    ///
    /// # Arguments
    /// * `left_root` - Directory whose children are filtered
    /// * `right_root` - Directory whose children form the reference key set
    /// * `output` - Which side of the comparison to return
    /// * `key` - The attribute to compare by
    pub fn new(
        left_root: impl Into<PathBuf>,
        right_root: impl Into<PathBuf>,
        output: OutputSelector,
        key: EquivalenceKey,
    ) -> Self {
        Self {
            left_root: left_root.into(),
            right_root: right_root.into(),
            output,
            key,
        }
    }

    /// Create a comparison request from options.
    pub fn with_options(
        left_root: impl Into<PathBuf>,
        right_root: impl Into<PathBuf>,
        options: CompareOptions,
    ) -> Self {
        Self::new(left_root, right_root, options.output, options.key)
    }

    /// Directory whose children are filtered.
    pub fn left_root(&self) -> &Path {
        &self.left_root
    }

    /// Directory whose children form the reference key set.
    pub fn right_root(&self) -> &Path {
        &self.right_root
    }

    /// Which side of the comparison to return.
    pub fn output(&self) -> OutputSelector {
        self.output
    }

    /// The attribute to compare by.
    pub fn key(&self) -> EquivalenceKey {
        self.key
    }
}

/// Keys of the right side, bucketed by policy hash.
#[derive(Debug, Default)]
struct KeySet {
    buckets: HashMap<u64, Vec<KeyValue>>,
}

impl KeySet {
    fn insert(&mut self, value: KeyValue) {
        let bucket: &mut Vec<KeyValue> = self.buckets.entry(value.digest()).or_default();
        if !bucket.contains(&value) {
            bucket.push(value);
        }
    }

    fn contains(&self, value: &KeyValue) -> bool {
        self.buckets
            .get(&value.digest())
            .is_some_and(|bucket| bucket.contains(value))
    }

    fn len(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }
}

/// Computes matching and non-matching children of two directories.
pub struct SetComparator<'a> {
    provider: &'a dyn DirectoryProvider,
}

impl<'a> SetComparator<'a> {
    /// Create a comparator over `provider`.
    pub fn new(provider: &'a dyn DirectoryProvider) -> Self {
        Self { provider }
    }

    /// Start a comparison.
    ///
    /// Both roots are checked first, then the right side's keys are
    /// collected. The left side is enumerated lazily as the returned
    /// sequence is consumed.
    ///
    /// # Arguments
    /// * `request` - What to compare
    ///
    /// # Errors
    /// Returns `NotFound` if either root is not an existing directory, or
    /// the first error raised while reading the right side's keys.
    pub fn compare(&self, request: ComparisonRequest) -> Result<Comparison<'a>, FileSystemError> {
        for root in [&request.left_root, &request.right_root] {
            if !self.provider.exists(root) {
                return Err(FileSystemError::not_found(root));
            }
        }

        let policy: Box<dyn EquivalencePolicy + 'a> = policy_for(request.key, self.provider);

        let mut right_keys: KeySet = KeySet::default();
        for entity in self.provider.subdirectories(&request.right_root)? {
            right_keys.insert(policy.project(&entity?)?);
        }

        log::debug!(
            "Comparing {} against {} distinct {:?} keys from {}",
            request.left_root.display(),
            right_keys.len(),
            request.key,
            request.right_root.display()
        );

        let left: EntityIter<'a> = self.provider.subdirectories(&request.left_root)?;

        Ok(Comparison {
            left,
            right_keys,
            policy,
            output: request.output,
        })
    }
}

/// Lazily evaluated result of a comparison.
///
/// Not stable under concurrent mutation of the left root.
pub struct Comparison<'a> {
    left: EntityIter<'a>,
    right_keys: KeySet,
    policy: Box<dyn EquivalencePolicy + 'a>,
    output: OutputSelector,
}

impl Comparison<'_> {
    /// The output side this comparison yields.
    pub fn output(&self) -> OutputSelector {
        self.output
    }
}

impl Iterator for Comparison<'_> {
    type Item = Result<DirectoryEntity, FileSystemError>;

    fn next(&mut self) -> Option<Self::Item> {
        let want_present: bool = self.output == OutputSelector::Matching;
        loop {
            let entity: DirectoryEntity = match self.left.next()? {
                Ok(entity) => entity,
                Err(e) => return Some(Err(e)),
            };
            let value: KeyValue = match self.policy.project(&entity) {
                Ok(value) => value,
                Err(e) => return Some(Err(e)),
            };
            if self.right_keys.contains(&value) == want_present {
                return Some(Ok(entity));
            }
        }
    }
}

/// Compare two directories on the local disk.
///
/// # Arguments
/// * `left_root` - Directory whose children are filtered
/// * `right_root` - Directory whose children form the reference key set
/// * `output` - Which side of the comparison to return
/// * `key` - The attribute to compare by
///
/// # Errors
/// Returns `NotFound` if either root does not exist.
pub fn compare(
    left_root: impl AsRef<Path>,
    right_root: impl AsRef<Path>,
    output: OutputSelector,
    key: EquivalenceKey,
) -> Result<Comparison<'static>, FileSystemError> {
    let request: ComparisonRequest = ComparisonRequest::new(
        left_root.as_ref(),
        right_root.as_ref(),
        output,
        key,
    );
    SetComparator::new(&LOCAL_FILE_SYSTEM).compare(request)
}
