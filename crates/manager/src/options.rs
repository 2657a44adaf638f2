//! Configuration options for opening a directory handle.

use rusty_dirmanager_watcher::WatchOptions;

/// Options for `DirectoryHandle::open`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HandleOptions {
    /// Create the directory (and missing parents) instead of failing.
    pub create_if_missing: bool,

    /// Options for the handle's change notification.
    pub watch: WatchOptions,
}

impl HandleOptions {
    /// Set whether a missing directory is created.
    ///
    /// # Arguments
    /// * `create` - Create the directory if it does not exist
    pub fn with_create_if_missing(mut self, create: bool) -> Self {
        self.create_if_missing = create;
        self
    }

    /// Set the change notification options.
    ///
    /// # Arguments
    /// * `watch` - Options used when notification is enabled
    pub fn with_watch(mut self, watch: WatchOptions) -> Self {
        self.watch = watch;
        self
    }
}
