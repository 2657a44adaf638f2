//! Managed directory handle for rusty-dirmanager.
//!
//! This crate composes the lower layers into one facade:
//! - `DirectoryHandle` - Properties, comparison, search, rename, transfers and notification
//! - `HandleOptions` - Creation and watch options
//! - `ManagerError` - Unified error over the filesystem, watch and platform layers
//! - `copy_directory` / `move_directory` - Whole-directory transfers

pub mod error;
pub mod handle;
pub mod options;
pub mod transfer;

pub use error::ManagerError;
pub use handle::DirectoryHandle;
pub use options::HandleOptions;
pub use transfer::{copy_directory, move_directory};

pub use rusty_dirmanager_filesystem::{
    DirectoryEntity, EquivalenceKey, OutputSelector, RenameOptions, RenameReport, RenameStrategy,
    SearchMode,
};
pub use rusty_dirmanager_watcher::{
    ChangeEvent, ChangeKind, ChangeKindSet, EventStream, SubscriptionId, WatchOptions,
};
