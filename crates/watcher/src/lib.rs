//! Normalized directory change notification for rusty-dirmanager.
//!
//! This crate bridges the platform watch backend to one event shape:
//! - `ChangeEvent` / `ChangeKind` - The normalized event
//! - `EventNormalizer` - Raw backend event translation, including rename pairing
//! - `ChangeNotifier` - Owned watch with callback and channel subscribers
//! - `WatchOptions` - Kind filtering and root event handling

pub mod error;
pub mod event;
pub mod normalize;
pub mod notifier;
pub mod options;

pub use error::WatchError;
pub use event::{ChangeEvent, ChangeKind, ChangeKindSet};
pub use normalize::EventNormalizer;
pub use notifier::{ChangeCallback, ChangeNotifier, EventStream, SubscriptionId, WatchState};
pub use options::{WatchOptions, DEFAULT_RENAME_WINDOW};
