//! Per-item progress reporting with cooperative cancellation.
//!
//! Batch operations call back once per item after the item is committed.
//! A callback answering `false` stops the batch before the next item; items
//! already processed stay done.

use std::marker::PhantomData;

/// Receives one report per processed batch item.
///
/// `T` is the report type of the batch, such as a rename report carrying
/// the item index and its old and new paths. Implementations run on the
/// thread driving the batch, which may be a blocking worker.
pub trait ProgressCallback<T>: Send + Sync {
    /// Report a committed item.
    ///
    /// # Arguments
    /// * `progress` - Report for the item just processed
    ///
    /// # Returns
    /// `false` to stop before the next item.
    fn on_progress(&self, progress: &T) -> bool;
}

/// Callback used when the caller wants no reports. Never cancels.
pub struct NoOpProgress;

impl<T> ProgressCallback<T> for NoOpProgress {
    fn on_progress(&self, _progress: &T) -> bool {
        true
    }
}

/// Adapter turning a closure into a `ProgressCallback`.
pub struct FnProgress<F, T> {
    callback: F,
    _marker: PhantomData<T>,
}

impl<F, T> FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    /// Wrap `callback`, which answers whether the batch should go on.
    pub fn new(callback: F) -> Self {
        Self {
            callback,
            _marker: PhantomData,
        }
    }
}

impl<F, T> ProgressCallback<T> for FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
    T: Send + Sync,
{
    fn on_progress(&self, progress: &T) -> bool {
        (self.callback)(progress)
    }
}

/// Shorthand for `FnProgress::new`, letting the report type be inferred
/// from the closure's argument.
pub fn progress_fn<F, T>(f: F) -> FnProgress<F, T>
where
    F: Fn(&T) -> bool + Send + Sync,
{
    FnProgress::new(f)
}
