//! Directory operations for rusty-dirmanager.
//!
//! This crate provides the synchronous core over directory trees:
//! - `DirectoryEntity` - Lightweight view over one directory
//! - `DirectoryProvider` / `LocalFileSystem` - Filesystem capability the engines consume
//! - `EquivalencePolicy` - Name, path, creation time and size equivalence
//! - `SetComparator` - Matching / non-matching children of two directories
//! - `SearchEngine` - Substring, regex and glob search over children
//! - `RenameEngine` - Batch rename strategies

pub mod compare;
pub mod entity;
pub mod equivalence;
pub mod error;
pub mod glob;
pub mod naming;
pub mod provider;
pub mod rename;
pub mod search;

// Re-export main types
pub use compare::{compare, CompareOptions, Comparison, ComparisonRequest, OutputSelector, SetComparator};
pub use entity::DirectoryEntity;
pub use equivalence::{
    policy_for, ByDateOfCreation, ByFullName, ByName, BySize, EquivalenceKey, EquivalencePolicy,
    KeyValue,
};
pub use error::FileSystemError;
pub use glob::{escape_glob, GlobFilter};
pub use naming::{is_valid_folder_name, is_valid_separator, validate_folder_name, validate_separator};
pub use provider::{DirectoryProvider, EntityIter, LocalFileSystem, LOCAL_FILE_SYSTEM};
pub use rename::{RenameEngine, RenameOptions, RenameProgress, RenameReport, RenameStrategy};
pub use search::{SearchEngine, SearchMode};
