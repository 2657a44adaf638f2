//! Configuration options for change notification.

use std::time::Duration;

use crate::event::ChangeKindSet;

/// How long a rename's first half waits for its second half.
pub const DEFAULT_RENAME_WINDOW: Duration = Duration::from_millis(100);

/// Configuration for a `ChangeNotifier`.
///
/// # Example
///
/// ```
/// use rusty_dirmanager_watcher::{ChangeKind, ChangeKindSet, WatchOptions};
///
/// let options = WatchOptions::default()
///     .with_kinds(ChangeKindSet::only(ChangeKind::Renamed))
///     .with_ignore_root_events(false);
/// assert!(!options.kinds.contains(ChangeKind::Created));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchOptions {
    /// Kinds of change delivered to subscribers.
    pub kinds: ChangeKindSet,

    /// Drop events about the watched directory itself.
    pub ignore_root_events: bool,

    /// Time a rename's source half waits for its destination half. An entry
    /// that moved out of the directory is reported as deleted once this
    /// elapses.
    pub rename_window: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            kinds: ChangeKindSet::ALL,
            ignore_root_events: true,
            rename_window: DEFAULT_RENAME_WINDOW,
        }
    }
}

impl WatchOptions {
    /// Set the kinds of change delivered to subscribers.
    ///
    /// # Arguments
    /// * `kinds` - Kinds to deliver
    pub fn with_kinds(mut self, kinds: ChangeKindSet) -> Self {
        self.kinds = kinds;
        self
    }

    /// Set whether events about the watched directory itself are dropped.
    pub fn with_ignore_root_events(mut self, ignore: bool) -> Self {
        self.ignore_root_events = ignore;
        self
    }

    /// Set how long a rename's source half waits for its destination half.
    pub fn with_rename_window(mut self, window: Duration) -> Self {
        self.rename_window = window;
        self
    }
}
