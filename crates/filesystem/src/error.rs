//! Error types for directory comparison, search and rename.

use rusty_dirmanager_common::PathError;
use thiserror::Error;

/// Errors that can occur during directory operations.
///
/// Every condition is its own variant so callers can tell a single bad
/// name apart from a vanished directory tree.
#[derive(Debug, Error)]
pub enum FileSystemError {
    /// A required directory does not exist.
    #[error("Directory not found: {path}")]
    NotFound {
        /// The missing directory.
        path: String,
    },

    /// A caller-supplied argument is unusable (empty key, wrong batch size, ...).
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Description of the problem.
        message: String,
    },

    /// A separator that could be mistaken for part of a folder name.
    #[error("Invalid separator {separator:?}: separators cannot be word characters or any of \\ / : * ? \" < > |")]
    InvalidSeparator {
        /// The rejected separator.
        separator: char,
    },

    /// A supplied or generated folder name contains reserved characters.
    #[error("Invalid folder name {name:?}: a folder name cannot contain any of \\ / : * ? \" < > |")]
    InvalidName {
        /// The rejected name.
        name: String,
    },

    /// A regex or glob pattern failed to compile.
    #[error("Invalid pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern as supplied.
        pattern: String,
        /// Why compilation failed.
        reason: String,
    },

    /// The operating system rejected an operation.
    #[error("IO error at {path}: {source}")]
    IoError {
        /// Path involved in the failed operation.
        path: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A path could not be normalized.
    #[error(transparent)]
    Path(#[from] PathError),

    /// Operation cancelled through a progress callback.
    #[error("Operation cancelled")]
    Cancelled,
}

impl FileSystemError {
    /// Create a `NotFound` error for a path.
    ///
    /// # Arguments
    /// * `path` - The missing directory
    pub fn not_found(path: &std::path::Path) -> Self {
        Self::NotFound {
            path: path.display().to_string(),
        }
    }

    /// Create an `IoError` for a path.
    ///
    /// # Arguments
    /// * `path` - Path involved in the failure
    /// * `source` - The underlying IO error
    pub fn io(path: &std::path::Path, source: std::io::Error) -> Self {
        Self::IoError {
            path: path.display().to_string(),
            source,
        }
    }

    /// Create an `InvalidArgument` error.
    ///
    /// # Arguments
    /// * `message` - Description of the problem
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Check whether this error belongs to the invalid-argument class.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            FileSystemError::InvalidArgument { .. } | FileSystemError::InvalidSeparator { .. }
        )
    }
}
