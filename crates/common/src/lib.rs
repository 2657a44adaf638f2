//! Shared types and utilities for rusty-dirmanager.
//!
//! This crate provides common functionality used across all rusty-dirmanager crates:
//! - Path normalization utilities
//! - Key hashing for equivalence policies
//! - Generic progress callback trait
//! - Shared constants and error types
//! - Platform detection and desktop path resolution
//! - Random name tokens

pub mod constants;
pub mod error;
pub mod hash;
pub mod path_utils;
pub mod platform;
pub mod progress;
pub mod random;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{PathError, PlatformError};
pub use hash::{hash_bytes, KeyHasher};
pub use path_utils::{leaf_name, lexical_normalize, normalize_full_path, parent_of, to_absolute};
pub use platform::{desktop_path, desktop_path_for, folder_view_command, FolderViewCommand, Platform};
pub use progress::{progress_fn, FnProgress, NoOpProgress, ProgressCallback};
pub use random::{ThreadRngTokens, TokenGenerator};
