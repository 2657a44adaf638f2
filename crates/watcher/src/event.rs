//! The normalized change event shape.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// What happened to an entry of a watched directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    Created,
    Deleted,
    Changed,
    Renamed,
}

impl ChangeKind {
    /// Bit used for this kind in a `ChangeKindSet`.
    pub const fn bit(self) -> u8 {
        match self {
            ChangeKind::Created => 1,
            ChangeKind::Deleted => 2,
            ChangeKind::Changed => 4,
            ChangeKind::Renamed => 8,
        }
    }
}

/// A set of change kinds, stored as bit flags.
///
/// Bits follow the usual host values: Created = 1, Deleted = 2,
/// Changed = 4, Renamed = 8, so `ALL` is 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeKindSet(u8);

impl ChangeKindSet {
    /// No kinds.
    pub const EMPTY: ChangeKindSet = ChangeKindSet(0);

    /// Every kind.
    pub const ALL: ChangeKindSet = ChangeKindSet(15);

    /// Build a set from raw bits. Unknown bits are dropped.
    pub const fn from_bits(bits: u8) -> Self {
        ChangeKindSet(bits & Self::ALL.0)
    }

    /// Raw bits of the set.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// A set holding a single kind.
    pub const fn only(kind: ChangeKind) -> Self {
        ChangeKindSet(kind.bit())
    }

    /// Check whether `kind` is in the set.
    pub const fn contains(self, kind: ChangeKind) -> bool {
        self.0 & kind.bit() != 0
    }

    /// Add a kind.
    pub const fn with(self, kind: ChangeKind) -> Self {
        ChangeKindSet(self.0 | kind.bit())
    }

    /// Remove a kind.
    pub const fn without(self, kind: ChangeKind) -> Self {
        ChangeKindSet(self.0 & !kind.bit())
    }

    /// Check whether the set is empty.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for ChangeKindSet {
    fn default() -> Self {
        Self::ALL
    }
}

impl FromIterator<ChangeKind> for ChangeKindSet {
    fn from_iter<I: IntoIterator<Item = ChangeKind>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

/// One normalized filesystem change.
///
/// Only `Renamed` events carry the old path and name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    kind: ChangeKind,
    full_path: PathBuf,
    name: String,
    old_full_path: Option<PathBuf>,
    old_name: Option<String>,
}

impl ChangeEvent {
    /// An entry appeared.
    pub fn created(path: impl Into<PathBuf>) -> Self {
        Self::simple(ChangeKind::Created, path.into())
    }

    /// An entry went away.
    pub fn deleted(path: impl Into<PathBuf>) -> Self {
        Self::simple(ChangeKind::Deleted, path.into())
    }

    /// An entry's content, size or timestamps changed.
    pub fn changed(path: impl Into<PathBuf>) -> Self {
        Self::simple(ChangeKind::Changed, path.into())
    }

    /// An entry moved from `old_path` to `new_path`.
    pub fn renamed(old_path: impl Into<PathBuf>, new_path: impl Into<PathBuf>) -> Self {
        let old_path: PathBuf = old_path.into();
        let new_path: PathBuf = new_path.into();
        Self {
            kind: ChangeKind::Renamed,
            name: leaf(&new_path),
            full_path: new_path,
            old_name: Some(leaf(&old_path)),
            old_full_path: Some(old_path),
        }
    }

    fn simple(kind: ChangeKind, full_path: PathBuf) -> Self {
        Self {
            kind,
            name: leaf(&full_path),
            full_path,
            old_full_path: None,
            old_name: None,
        }
    }

    pub fn kind(&self) -> ChangeKind {
        self.kind
    }

    /// Path of the affected entry (the new path for renames).
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Leaf name of the affected entry (the new name for renames).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path before a rename.
    pub fn old_full_path(&self) -> Option<&Path> {
        self.old_full_path.as_deref()
    }

    /// Name before a rename.
    pub fn old_name(&self) -> Option<&str> {
        self.old_name.as_deref()
    }
}

fn leaf(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_bits() {
        assert_eq!(ChangeKind::Created.bit(), 1);
        assert_eq!(ChangeKind::Deleted.bit(), 2);
        assert_eq!(ChangeKind::Changed.bit(), 4);
        assert_eq!(ChangeKind::Renamed.bit(), 8);
        assert_eq!(ChangeKindSet::ALL.bits(), 15);
    }

    #[test]
    fn test_set_operations() {
        let set: ChangeKindSet = ChangeKindSet::only(ChangeKind::Created).with(ChangeKind::Renamed);
        assert_eq!(set.bits(), 9);
        assert!(set.contains(ChangeKind::Renamed));
        assert!(!set.contains(ChangeKind::Deleted));

        let trimmed: ChangeKindSet = set.without(ChangeKind::Created);
        assert_eq!(trimmed, ChangeKindSet::only(ChangeKind::Renamed));
        assert!(trimmed.without(ChangeKind::Renamed).is_empty());
    }

    #[test]
    fn test_from_bits_drops_unknown() {
        assert_eq!(ChangeKindSet::from_bits(0xFF), ChangeKindSet::ALL);
        assert_eq!(ChangeKindSet::from_bits(4).bits(), 4);
    }

    #[test]
    fn test_collect_into_set() {
        let set: ChangeKindSet = [ChangeKind::Deleted, ChangeKind::Changed].into_iter().collect();
        assert_eq!(set.bits(), 6);
        assert_eq!(ChangeKindSet::default(), ChangeKindSet::ALL);
    }

    #[test]
    fn test_only_renames_carry_old_fields() {
        let created: ChangeEvent = ChangeEvent::created("/w/new");
        assert_eq!(created.name(), "new");
        assert_eq!(created.old_full_path(), None);
        assert_eq!(created.old_name(), None);

        let renamed: ChangeEvent = ChangeEvent::renamed("/w/old", "/w/new");
        assert_eq!(renamed.kind(), ChangeKind::Renamed);
        assert_eq!(renamed.full_path(), Path::new("/w/new"));
        assert_eq!(renamed.name(), "new");
        assert_eq!(renamed.old_full_path(), Some(Path::new("/w/old")));
        assert_eq!(renamed.old_name(), Some("old"));
    }
}
