//! Error types for change notification.

use thiserror::Error;

/// Errors that can occur while enabling change notification.
#[derive(Debug, Error)]
pub enum WatchError {
    /// The directory to watch does not exist.
    #[error("Cannot watch missing directory: {path}")]
    NotFound {
        /// The missing directory.
        path: String,
    },

    /// The platform watch backend refused the watch.
    #[error("Watch backend failed for {path}: {source}")]
    Backend {
        /// The directory being watched.
        path: String,
        /// The underlying backend error.
        #[source]
        source: notify::Error,
    },
}
