//! Owned directory watch with subscriber dispatch.
//!
//! A `ChangeNotifier` wraps one non-recursive OS watch on one directory.
//! Raw backend events are queued to a delivery thread, normalized there and
//! handed to every subscriber. The delivery thread also wakes up when a
//! rename half has waited too long, so a move out of the directory is
//! reported without waiting for unrelated activity.
//!
//! Each enable starts a new generation. Deliveries check the generation
//! before every event, and `disable()` waits for running deliveries, so
//! nothing is delivered once it has returned.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{
    Arc, Condvar, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};

use crate::error::WatchError;
use crate::event::{ChangeEvent, ChangeKindSet};
use crate::normalize::EventNormalizer;
use crate::options::WatchOptions;

/// Callback invoked for each delivered event.
pub type ChangeCallback = Arc<dyn Fn(&ChangeEvent) + Send + Sync>;

type RawEvent = notify::Result<notify::Event>;

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Lifecycle of a watch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Disabled,
    Enabling,
    Enabled,
    Disabling,
}

impl WatchState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => WatchState::Enabling,
            2 => WatchState::Enabled,
            3 => WatchState::Disabling,
            _ => WatchState::Disabled,
        }
    }
}

thread_local! {
    /// Set while the current thread is delivering events.
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

/// State shared with the delivery thread.
struct Dispatch {
    /// Generation allowed to deliver; 0 while disabled.
    active: AtomicU64,
    /// Deliveries currently running.
    in_flight: Mutex<usize>,
    idle: Condvar,
    subscribers: RwLock<Vec<(SubscriptionId, ChangeCallback)>>,
    normalizer: Mutex<EventNormalizer>,
    kinds: ChangeKindSet,
}

/// One running delivery, counted until dropped.
struct Delivery<'a> {
    dispatch: &'a Dispatch,
    nested: bool,
}

impl Drop for Delivery<'_> {
    fn drop(&mut self) {
        DELIVERING.with(|flag| flag.set(self.nested));
        let mut in_flight: MutexGuard<'_, usize> = lock(&self.dispatch.in_flight);
        *in_flight -= 1;
        if *in_flight == 0 {
            self.dispatch.idle.notify_all();
        }
    }
}

impl Dispatch {
    fn new(normalizer: EventNormalizer, kinds: ChangeKindSet) -> Self {
        Self {
            active: AtomicU64::new(0),
            in_flight: Mutex::new(0),
            idle: Condvar::new(),
            subscribers: RwLock::new(Vec::new()),
            normalizer: Mutex::new(normalizer),
            kinds,
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.active.load(Ordering::SeqCst) == generation
    }

    fn begin(&self) -> Delivery<'_> {
        // Counted before the generation check so a concurrent fence sees it
        *lock(&self.in_flight) += 1;
        let nested: bool = DELIVERING.with(|flag| flag.replace(true));
        Delivery {
            dispatch: self,
            nested,
        }
    }

    /// Wait until no delivery is running.
    ///
    /// From inside a delivery this returns at once: the caller's own
    /// delivery stops at its next generation check.
    fn fence(&self) {
        if DELIVERING.with(Cell::get) {
            return;
        }
        let mut in_flight: MutexGuard<'_, usize> = lock(&self.in_flight);
        while *in_flight > 0 {
            in_flight = self
                .idle
                .wait(in_flight)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    fn handle(&self, generation: u64, result: RawEvent) {
        let _delivery: Delivery<'_> = self.begin();
        if !self.is_current(generation) {
            tracing::trace!("Dropping event from released watch generation {}", generation);
            return;
        }

        let event: notify::Event = match result {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("Watch backend error: {}", e);
                return;
            }
        };

        let changes: Vec<ChangeEvent> = lock(&self.normalizer).normalize(&event);
        self.deliver(generation, changes);
    }

    fn expire(&self, generation: u64, now: Instant) {
        let _delivery: Delivery<'_> = self.begin();
        if !self.is_current(generation) {
            return;
        }

        let changes: Vec<ChangeEvent> = lock(&self.normalizer).expire(now);
        self.deliver(generation, changes);
    }

    fn deliver(&self, generation: u64, changes: Vec<ChangeEvent>) {
        if changes.is_empty() {
            return;
        }

        let subscribers: Vec<ChangeCallback> = read(&self.subscribers)
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();

        for change in changes {
            // A callback may have disabled the watch
            if !self.is_current(generation) {
                return;
            }
            if subscribers.is_empty() || !self.kinds.contains(change.kind()) {
                tracing::trace!("Not dispatching {:?} {}", change.kind(), change.full_path().display());
                continue;
            }
            tracing::trace!("Dispatching {:?} {}", change.kind(), change.full_path().display());
            for callback in &subscribers {
                callback(&change);
            }
        }
    }
}

/// Delivery loop for one watch generation.
///
/// Blocks on the backend queue, waking early when a held rename half is
/// due. Exits once the generation is released or the backend is gone.
fn run_delivery(dispatch: Arc<Dispatch>, generation: u64, receiver: Receiver<RawEvent>) {
    while dispatch.is_current(generation) {
        let deadline: Option<Instant> = lock(&dispatch.normalizer).next_deadline();
        let received: Result<RawEvent, RecvTimeoutError> = match deadline {
            Some(deadline) => {
                receiver.recv_timeout(deadline.saturating_duration_since(Instant::now()))
            }
            None => receiver.recv().map_err(|_| RecvTimeoutError::Disconnected),
        };

        match received {
            Ok(result) => dispatch.handle(generation, result),
            Err(RecvTimeoutError::Timeout) => dispatch.expire(generation, Instant::now()),
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    tracing::trace!("Delivery for watch generation {} finished", generation);
}

/// Change notification for one directory.
///
/// At most one OS watch is active at a time. The watch is released on
/// `disable()` or when the notifier is dropped.
pub struct ChangeNotifier {
    path: PathBuf,
    options: WatchOptions,
    /// Serializes enable and disable; holds the live OS watch.
    watcher: Mutex<Option<RecommendedWatcher>>,
    state: AtomicU8,
    dispatch: Arc<Dispatch>,
    next_generation: AtomicU64,
    next_subscription: AtomicU64,
}

impl ChangeNotifier {
    /// Create a disabled notifier for `path`.
    ///
    /// # Arguments
    /// * `path` - Directory to watch
    /// * `options` - Event filtering options
    pub fn new(path: impl Into<PathBuf>, options: WatchOptions) -> Self {
        let path: PathBuf = path.into();
        let normalizer: EventNormalizer =
            EventNormalizer::new(path.clone(), options.ignore_root_events)
                .with_rename_window(options.rename_window);
        Self {
            path,
            options,
            watcher: Mutex::new(None),
            state: AtomicU8::new(WatchState::Disabled as u8),
            dispatch: Arc::new(Dispatch::new(normalizer, options.kinds)),
            next_generation: AtomicU64::new(0),
            next_subscription: AtomicU64::new(0),
        }
    }

    /// The watched directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The options this notifier was created with.
    pub fn options(&self) -> WatchOptions {
        self.options
    }

    /// Current lifecycle state. Safe to call from a subscriber.
    pub fn state(&self) -> WatchState {
        WatchState::from_u8(self.state.load(Ordering::SeqCst))
    }

    /// Check whether the OS watch is active.
    pub fn is_enabled(&self) -> bool {
        self.state() == WatchState::Enabled
    }

    fn set_state(&self, state: WatchState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }

    /// Start watching. Does nothing if already enabled.
    ///
    /// # Errors
    /// Returns `NotFound` if the directory is missing, or `Backend` if the
    /// platform refuses the watch. The notifier stays disabled on error.
    pub fn enable(&self) -> Result<(), WatchError> {
        let mut slot: MutexGuard<'_, Option<RecommendedWatcher>> = lock(&self.watcher);
        if slot.is_some() {
            return Ok(());
        }

        self.set_state(WatchState::Enabling);
        tracing::debug!("Enabling change notification for {}", self.path.display());

        match self.start_watch() {
            Ok(watcher) => {
                *slot = Some(watcher);
                self.set_state(WatchState::Enabled);
                tracing::debug!("Change notification enabled for {}", self.path.display());
                Ok(())
            }
            Err(e) => {
                self.dispatch.active.store(0, Ordering::SeqCst);
                self.set_state(WatchState::Disabled);
                Err(e)
            }
        }
    }

    fn start_watch(&self) -> Result<RecommendedWatcher, WatchError> {
        if !self.path.is_dir() {
            return Err(WatchError::NotFound {
                path: self.path.display().to_string(),
            });
        }

        let backend_error = |source: notify::Error| WatchError::Backend {
            path: self.path.display().to_string(),
            source,
        };

        let generation: u64 = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.dispatch.normalizer).reset();
        self.dispatch.active.store(generation, Ordering::SeqCst);

        let (sender, receiver): (Sender<RawEvent>, Receiver<RawEvent>) = mpsc::channel();
        let dispatch: Arc<Dispatch> = Arc::clone(&self.dispatch);
        std::thread::Builder::new()
            .name("dirmanager-watch".to_string())
            .spawn(move || run_delivery(dispatch, generation, receiver))
            .map_err(|e| backend_error(notify::Error::io(e)))?;

        // Dropping the watcher drops the sender, which ends the delivery thread
        let mut watcher: RecommendedWatcher =
            notify::recommended_watcher(sender).map_err(backend_error)?;
        watcher
            .watch(&self.path, RecursiveMode::NonRecursive)
            .map_err(backend_error)?;

        Ok(watcher)
    }

    /// Stop watching and release the OS watch.
    ///
    /// Safe to call in any state, any number of times, including from a
    /// subscriber. Once this returns no further events are delivered; when
    /// called from a subscriber, the event being delivered is the last.
    pub fn disable(&self) {
        let released: RecommendedWatcher = {
            let mut slot: MutexGuard<'_, Option<RecommendedWatcher>> = lock(&self.watcher);
            let Some(released) = slot.take() else {
                return;
            };
            self.set_state(WatchState::Disabling);
            self.dispatch.active.store(0, Ordering::SeqCst);
            released
        };
        tracing::debug!("Disabling change notification for {}", self.path.display());

        // No lock is held here, so subscribers may query the notifier
        self.dispatch.fence();
        drop(released);

        let slot: MutexGuard<'_, Option<RecommendedWatcher>> = lock(&self.watcher);
        if slot.is_none() {
            lock(&self.dispatch.normalizer).reset();
            self.set_state(WatchState::Disabled);
        }
        tracing::debug!("Change notification disabled for {}", self.path.display());
    }

    /// Register a callback for delivered events.
    ///
    /// Callbacks run on the notifier's delivery thread, one event at a time.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ChangeEvent) + Send + Sync + 'static,
    {
        let id: SubscriptionId =
            SubscriptionId(self.next_subscription.fetch_add(1, Ordering::SeqCst));
        write(&self.dispatch.subscribers).push((id, Arc::new(callback)));
        id
    }

    /// Remove a callback.
    ///
    /// # Returns
    /// `true` if the subscription existed.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut subscribers = write(&self.dispatch.subscribers);
        let before: usize = subscribers.len();
        subscribers.retain(|(existing, _)| *existing != id);
        subscribers.len() != before
    }

    /// Number of attached subscribers.
    pub fn subscriber_count(&self) -> usize {
        read(&self.dispatch.subscribers).len()
    }

    /// Subscribe through a channel instead of a callback.
    pub fn events(&self) -> EventStream {
        let (sender, receiver): (Sender<ChangeEvent>, Receiver<ChangeEvent>) = mpsc::channel();
        let sender: Mutex<Sender<ChangeEvent>> = Mutex::new(sender);
        let id: SubscriptionId = self.subscribe(move |event: &ChangeEvent| {
            // A dropped receiver just stops listening
            let _ = lock(&sender).send(event.clone());
        });
        EventStream { id, receiver }
    }
}

impl Drop for ChangeNotifier {
    fn drop(&mut self) {
        self.disable();
    }
}

/// Channel of delivered events.
pub struct EventStream {
    id: SubscriptionId,
    receiver: Receiver<ChangeEvent>,
}

impl EventStream {
    /// Subscription feeding this stream.
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait up to `timeout` for the next event.
    ///
    /// # Returns
    /// `None` on timeout or once the notifier is gone.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        match self.receiver.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Take an event if one is waiting.
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.receiver.try_recv().ok()
    }

    /// Block until the next event, or `None` once the notifier is gone.
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.receiver.recv().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeKind;
    use notify::event::{CreateKind, EventKind, ModifyKind, RenameMode};
    use std::sync::atomic::AtomicUsize;

    fn dispatch_with(kinds: ChangeKindSet) -> Arc<Dispatch> {
        let dispatch: Dispatch = Dispatch::new(EventNormalizer::new("/w", true), kinds);
        dispatch.active.store(1, Ordering::SeqCst);
        Arc::new(dispatch)
    }

    fn create_event(path: &str) -> RawEvent {
        Ok(notify::Event::new(EventKind::Create(CreateKind::Folder)).add_path(PathBuf::from(path)))
    }

    fn counting(dispatch: &Dispatch) -> Arc<AtomicUsize> {
        let count: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
        let seen: Arc<AtomicUsize> = Arc::clone(&count);
        let callback: ChangeCallback = Arc::new(move |_: &ChangeEvent| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        write(&dispatch.subscribers).push((SubscriptionId(0), callback));
        count
    }

    #[test]
    fn test_dispatch_delivers_current_generation() {
        let dispatch: Arc<Dispatch> = dispatch_with(ChangeKindSet::ALL);
        let count: Arc<AtomicUsize> = counting(&dispatch);

        dispatch.handle(1, create_event("/w/a"));

        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(*lock(&dispatch.in_flight), 0);
    }

    #[test]
    fn test_dispatch_drops_stale_generation() {
        // Given: A dispatcher whose watch was released
        let dispatch: Arc<Dispatch> = dispatch_with(ChangeKindSet::ALL);
        let count: Arc<AtomicUsize> = counting(&dispatch);
        dispatch.active.store(0, Ordering::SeqCst);

        // When: An in-flight event from generation 1 arrives
        dispatch.handle(1, create_event("/w/a"));

        // Then: Nothing is delivered
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_dispatch_filters_kinds() {
        let dispatch: Arc<Dispatch> = dispatch_with(ChangeKindSet::only(ChangeKind::Renamed));
        let count: Arc<AtomicUsize> = counting(&dispatch);

        dispatch.handle(1, create_event("/w/a"));

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backend_errors_are_not_dispatched() {
        let dispatch: Arc<Dispatch> = dispatch_with(ChangeKindSet::ALL);
        let count: Arc<AtomicUsize> = counting(&dispatch);

        dispatch.handle(1, Err(notify::Error::generic("boom")));

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_delivery_loop_expires_held_rename() {
        // Given: A delivery loop fed only the source half of a rename
        let dispatch: Arc<Dispatch> = dispatch_with(ChangeKindSet::ALL);
        let (events_tx, events_rx): (Sender<ChangeEvent>, Receiver<ChangeEvent>) = mpsc::channel();
        let events_tx: Mutex<Sender<ChangeEvent>> = Mutex::new(events_tx);
        let callback: ChangeCallback = Arc::new(move |event: &ChangeEvent| {
            let _ = lock(&events_tx).send(event.clone());
        });
        write(&dispatch.subscribers).push((SubscriptionId(0), callback));

        let (raw_tx, raw_rx): (Sender<RawEvent>, Receiver<RawEvent>) = mpsc::channel();
        let looping: Arc<Dispatch> = Arc::clone(&dispatch);
        let worker = std::thread::spawn(move || run_delivery(looping, 1, raw_rx));

        // When: The destination half never arrives
        let from: notify::Event =
            notify::Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::From)))
                .add_path(PathBuf::from("/w/leaving"))
                .set_tracker(5);
        raw_tx.send(Ok(from)).unwrap();

        // Then: The loop reports the move-out on its own
        let event: ChangeEvent = events_rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(event, ChangeEvent::deleted("/w/leaving"));

        drop(raw_tx);
        worker.join().unwrap();
    }

    #[test]
    fn test_fence_inside_delivery_returns() {
        // Given: A subscriber that releases the generation and fences
        let dispatch: Arc<Dispatch> = dispatch_with(ChangeKindSet::ALL);
        let inner: Arc<Dispatch> = Arc::clone(&dispatch);
        let calls: Arc<AtomicUsize> = Arc::new(AtomicUsize::new(0));
        let seen: Arc<AtomicUsize> = Arc::clone(&calls);
        let callback: ChangeCallback = Arc::new(move |_: &ChangeEvent| {
            seen.fetch_add(1, Ordering::SeqCst);
            inner.active.store(0, Ordering::SeqCst);
            inner.fence();
        });
        write(&dispatch.subscribers).push((SubscriptionId(0), callback));

        // When: An event with two changes is delivered
        let both: notify::Event = notify::Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(PathBuf::from("/w/a"))
            .add_path(PathBuf::from("/w/b"));
        dispatch.handle(1, Ok(both));

        // Then: The delivery stops after the first change and nothing is left in flight
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(*lock(&dispatch.in_flight), 0);
        assert!(!DELIVERING.with(Cell::get));
    }

    #[test]
    fn test_subscribe_and_unsubscribe() {
        let notifier: ChangeNotifier = ChangeNotifier::new("/w", WatchOptions::default());
        let a: SubscriptionId = notifier.subscribe(|_| {});
        let b: SubscriptionId = notifier.subscribe(|_| {});
        assert_ne!(a, b);
        assert_eq!(notifier.subscriber_count(), 2);

        assert!(notifier.unsubscribe(a));
        assert!(!notifier.unsubscribe(a));
        assert_eq!(notifier.subscriber_count(), 1);
    }

    #[test]
    fn test_disable_when_disabled_is_noop() {
        let notifier: ChangeNotifier = ChangeNotifier::new("/w", WatchOptions::default());
        notifier.disable();
        notifier.disable();
        assert_eq!(notifier.state(), WatchState::Disabled);
    }

    #[test]
    fn test_state_round_trips_through_atomic() {
        for state in [
            WatchState::Disabled,
            WatchState::Enabling,
            WatchState::Enabled,
            WatchState::Disabling,
        ] {
            assert_eq!(WatchState::from_u8(state as u8), state);
        }
    }
}
