//! Filtering a directory's immediate children by name.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::entity::DirectoryEntity;
use crate::error::FileSystemError;
use crate::glob::GlobFilter;
use crate::provider::{DirectoryProvider, EntityIter};

/// How a search key is interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchMode {
    /// Case-insensitive substring of the name.
    #[default]
    Name,
    /// Case-insensitive regular expression matched anywhere in the name.
    Regex,
    /// Case-insensitive glob matched against the whole name.
    Glob,
}

/// Searches the immediate children of a directory.
///
/// Every search checks the root first, then compiles the key, then
/// enumerates lazily.
pub struct SearchEngine<'a> {
    provider: &'a dyn DirectoryProvider,
}

impl<'a> SearchEngine<'a> {
    /// Create a search engine over `provider`.
    pub fn new(provider: &'a dyn DirectoryProvider) -> Self {
        Self { provider }
    }

    /// Find children whose name contains `key`, ignoring case.
    ///
    /// # Arguments
    /// * `root` - Directory to search
    /// * `key` - Substring to look for; `None` matches every child
    ///
    /// # Errors
    /// Returns `NotFound` if `root` does not exist.
    pub fn search_by_name(
        &self,
        root: &Path,
        key: Option<&str>,
    ) -> Result<EntityIter<'a>, FileSystemError> {
        self.ensure_root(root)?;
        let needle: String = key.unwrap_or_default().to_lowercase();
        self.filtered(root, move |entity: &DirectoryEntity| {
            entity.name().to_lowercase().contains(&needle)
        })
    }

    /// Find children whose name matches `pattern`, ignoring case.
    ///
    /// # Arguments
    /// * `root` - Directory to search
    /// * `pattern` - Regular expression; `None` matches every child
    ///
    /// # Errors
    /// Returns `NotFound` if `root` does not exist, or `InvalidPattern` if
    /// the pattern does not compile.
    pub fn search_by_regex(
        &self,
        root: &Path,
        pattern: Option<&str>,
    ) -> Result<EntityIter<'a>, FileSystemError> {
        self.ensure_root(root)?;
        let regex: Regex = compile_regex(pattern.unwrap_or_default(), true)?;
        self.filtered(root, move |entity: &DirectoryEntity| {
            regex.is_match(entity.name())
        })
    }

    /// Find children whose whole name matches a glob, ignoring case.
    ///
    /// # Arguments
    /// * `root` - Directory to search
    /// * `pattern` - Glob pattern; `None` matches every child
    ///
    /// # Errors
    /// Returns `NotFound` if `root` does not exist, or `InvalidPattern` if
    /// the pattern does not compile.
    pub fn search_by_glob(
        &self,
        root: &Path,
        pattern: Option<&str>,
    ) -> Result<EntityIter<'a>, FileSystemError> {
        self.ensure_root(root)?;
        let filter: GlobFilter = GlobFilter::pattern(pattern.unwrap_or_default())?;
        self.search_with_filter(root, filter)
    }

    /// Find children accepted by a prebuilt include/exclude filter.
    ///
    /// # Errors
    /// Returns `NotFound` if `root` does not exist.
    pub fn search_with_filter(
        &self,
        root: &Path,
        filter: GlobFilter,
    ) -> Result<EntityIter<'a>, FileSystemError> {
        self.ensure_root(root)?;
        self.filtered(root, move |entity: &DirectoryEntity| {
            filter.matches(entity.name())
        })
    }

    /// Dispatch a search by mode.
    ///
    /// # Arguments
    /// * `root` - Directory to search
    /// * `key` - Substring or pattern, per `mode`
    /// * `mode` - How to interpret `key`
    ///
    /// # Errors
    /// See the per-mode methods.
    pub fn search(
        &self,
        root: &Path,
        key: Option<&str>,
        mode: SearchMode,
    ) -> Result<EntityIter<'a>, FileSystemError> {
        match mode {
            SearchMode::Name => self.search_by_name(root, key),
            SearchMode::Regex => self.search_by_regex(root, key),
            SearchMode::Glob => self.search_by_glob(root, key),
        }
    }

    fn ensure_root(&self, root: &Path) -> Result<(), FileSystemError> {
        if self.provider.exists(root) {
            Ok(())
        } else {
            Err(FileSystemError::not_found(root))
        }
    }

    fn filtered<F>(&self, root: &Path, mut predicate: F) -> Result<EntityIter<'a>, FileSystemError>
    where
        F: FnMut(&DirectoryEntity) -> bool + 'a,
    {
        let children: EntityIter<'a> = self.provider.subdirectories(root)?;
        Ok(Box::new(children.filter(move |entry| match entry {
            Ok(entity) => predicate(entity),
            Err(_) => true,
        })))
    }
}

/// Compile a regular expression for name matching.
///
/// # Errors
/// Returns `InvalidPattern` if the pattern does not compile.
pub(crate) fn compile_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, FileSystemError> {
    RegexBuilder::new(pattern)
        .case_insensitive(case_insensitive)
        .build()
        .map_err(|e| FileSystemError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}
