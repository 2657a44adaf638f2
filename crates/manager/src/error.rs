//! Error types for the managed directory handle.

use rusty_dirmanager_common::{PathError, PlatformError};
use rusty_dirmanager_filesystem::FileSystemError;
use rusty_dirmanager_watcher::WatchError;
use thiserror::Error;

/// Errors surfaced by `DirectoryHandle`.
#[derive(Debug, Error)]
pub enum ManagerError {
    #[error(transparent)]
    FileSystem(#[from] FileSystemError),

    #[error(transparent)]
    Watch(#[from] WatchError),

    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// The native file browser could not be started.
    #[error("Failed to launch {program}: {source}")]
    Launch {
        /// Program that failed to start.
        program: String,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A background task panicked or was cancelled.
    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<PathError> for ManagerError {
    fn from(err: PathError) -> Self {
        ManagerError::FileSystem(FileSystemError::Path(err))
    }
}

impl ManagerError {
    /// Check whether a required directory was missing.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            ManagerError::FileSystem(FileSystemError::NotFound { .. })
                | ManagerError::Watch(WatchError::NotFound { .. })
        )
    }
}
