//! Filesystem capabilities consumed by the comparator, search and rename engines.

use std::fs::Metadata;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use rusty_dirmanager_common::{normalize_full_path, parent_of};
use walkdir::WalkDir;

use crate::entity::DirectoryEntity;
use crate::error::FileSystemError;

/// Lazily evaluated sequence of directory entities.
pub type EntityIter<'a> = Box<dyn Iterator<Item = Result<DirectoryEntity, FileSystemError>> + 'a>;

/// Minimal filesystem capability the directory engines depend on.
///
/// Implementations must be thread-safe so engines can be driven from
/// background tasks.
pub trait DirectoryProvider: Send + Sync {
    /// Check whether a directory exists at `path`.
    fn exists(&self, path: &Path) -> bool;

    /// Lazily enumerate the immediate subdirectories of `path`.
    ///
    /// Files are never yielded. Order is stable for an unchanged tree.
    ///
    /// # Errors
    /// Returns `NotFound` if `path` is not an existing directory.
    fn subdirectories(&self, path: &Path) -> Result<EntityIter<'_>, FileSystemError>;

    /// Collect the immediate subdirectories of `path`.
    ///
    /// # Errors
    /// Returns `NotFound` if `path` is missing, or the first enumeration failure.
    fn list_immediate_subdirectories(
        &self,
        path: &Path,
    ) -> Result<Vec<DirectoryEntity>, FileSystemError> {
        self.subdirectories(path)?.collect()
    }

    /// Rename a directory within its parent.
    ///
    /// # Arguments
    /// * `entity` - Directory to rename
    /// * `new_name` - New leaf name
    ///
    /// # Returns
    /// The full path of the renamed directory.
    ///
    /// # Errors
    /// Returns an IO error if the OS rejects the rename, including when the
    /// target name is already taken.
    fn rename_in_place(
        &self,
        entity: &DirectoryEntity,
        new_name: &str,
    ) -> Result<PathBuf, FileSystemError>;

    /// Sum the sizes of all files below `path`.
    ///
    /// # Errors
    /// Returns `NotFound` if `path` is missing.
    fn recursive_aggregate_size(&self, path: &Path) -> Result<u64, FileSystemError>;
}

/// `DirectoryProvider` backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFileSystem;

impl LocalFileSystem {
    /// Create a local filesystem provider.
    pub fn new() -> Self {
        Self
    }
}

/// Shared local provider for callers that do not inject their own.
pub static LOCAL_FILE_SYSTEM: LocalFileSystem = LocalFileSystem;

impl DirectoryProvider for LocalFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn subdirectories(&self, path: &Path) -> Result<EntityIter<'_>, FileSystemError> {
        let root: PathBuf = normalize_full_path(path)?;
        if !root.is_dir() {
            return Err(FileSystemError::not_found(&root));
        }

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        Ok(Box::new(walker.filter_map(|entry| {
            let entry: walkdir::DirEntry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path: String = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    return Some(Err(FileSystemError::IoError {
                        path,
                        source: e.into(),
                    }));
                }
            };

            // Symlinks are not followed, so a link to a directory is skipped
            if !entry.file_type().is_dir() {
                return None;
            }

            match entry.metadata() {
                Ok(metadata) => Some(DirectoryEntity::from_metadata(
                    entry.path().to_path_buf(),
                    &metadata,
                )),
                Err(e) => {
                    let io: std::io::Error = e.into();
                    if io.kind() == ErrorKind::NotFound {
                        log::warn!("Skipping vanished directory {}", entry.path().display());
                        None
                    } else {
                        Some(Err(FileSystemError::io(entry.path(), io)))
                    }
                }
            }
        })))
    }

    fn rename_in_place(
        &self,
        entity: &DirectoryEntity,
        new_name: &str,
    ) -> Result<PathBuf, FileSystemError> {
        let source: &Path = entity.full_path();
        let parent: PathBuf = parent_of(source)?;
        let target: PathBuf = parent.join(new_name);

        // fs::rename silently replaces an empty directory on Unix
        if target.symlink_metadata().is_ok() && !same_entry(source, &target) {
            return Err(FileSystemError::io(
                &target,
                std::io::Error::new(
                    ErrorKind::AlreadyExists,
                    format!("cannot rename {} to {}", source.display(), target.display()),
                ),
            ));
        }

        std::fs::rename(source, &target).map_err(|e| FileSystemError::io(source, e))?;
        Ok(target)
    }

    fn recursive_aggregate_size(&self, path: &Path) -> Result<u64, FileSystemError> {
        aggregate_size(path)
    }
}

/// Check whether two paths name the same entry (case-only renames on
/// case-insensitive volumes).
fn same_entry(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Sum the sizes of all regular files below a directory.
///
/// # Arguments
/// * `path` - Directory to measure
///
/// # Errors
/// Returns `NotFound` if `path` is not a directory, or an IO error if the
/// walk fails.
pub(crate) fn aggregate_size(path: &Path) -> Result<u64, FileSystemError> {
    if !path.is_dir() {
        return Err(FileSystemError::not_found(path));
    }

    let mut total: u64 = 0;
    for entry in WalkDir::new(path).follow_links(false).into_iter() {
        let entry: walkdir::DirEntry = entry.map_err(|e| FileSystemError::IoError {
            path: e
                .path()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            source: e.into(),
        })?;

        if entry.file_type().is_file() {
            let metadata: Metadata = entry.metadata().map_err(|e| FileSystemError::IoError {
                path: entry.path().display().to_string(),
                source: e.into(),
            })?;
            total += metadata.len();
        }
    }

    Ok(total)
}
