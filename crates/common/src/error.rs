//! Shared error types used across rusty-dirmanager crates.

use thiserror::Error;

/// Path-related errors shared across crates.
#[derive(Debug, Error, Clone)]
pub enum PathError {
    /// Path is invalid or malformed.
    #[error("Invalid path: {path}")]
    InvalidPath {
        /// The invalid path.
        path: String,
    },

    /// Path has no final component (e.g. a filesystem root).
    #[error("Path has no leaf name: {path}")]
    NoLeafName {
        /// The path without a leaf segment.
        path: String,
    },

    /// Leaf name is not valid UTF-8.
    #[error("Path has a non-UTF-8 leaf name: {path}")]
    NonUtf8Name {
        /// The offending path, lossily displayed.
        path: String,
        /// The leaf name with invalid bytes replaced.
        name: String,
    },

    /// Path has no parent directory.
    #[error("Path has no parent: {path}")]
    NoParent {
        /// The path without a parent.
        path: String,
    },

    /// IO error occurred while accessing path.
    #[error("IO error at {path}: {message}")]
    IoError {
        /// Path where error occurred.
        path: String,
        /// Error message.
        message: String,
    },
}

impl PathError {
    /// Create an IoError from std::io::Error.
    ///
    /// # Arguments
    /// * `path` - Path where the error occurred
    /// * `err` - The underlying IO error
    pub fn from_io(path: impl Into<String>, err: std::io::Error) -> Self {
        Self::IoError {
            path: path.into(),
            message: err.to_string(),
        }
    }
}

/// Errors raised by platform-dependent helpers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PlatformError {
    /// The running operating system is not one we know how to serve.
    #[error("Unknown operating system, cannot {operation}")]
    UnknownPlatform {
        /// What was being attempted.
        operation: &'static str,
    },

    /// A required environment variable is missing.
    #[error("Environment variable {name} is not set")]
    MissingEnvironment {
        /// Name of the variable.
        name: &'static str,
    },
}
