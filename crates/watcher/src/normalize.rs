//! Translation of raw `notify` events into `ChangeEvent`s.
//!
//! Backends report renames differently. Linux and Windows send a `From`
//! half, a `To` half and then a combined `Both` event; other backends only
//! send the halves, or only the combined event. The normalizer turns each
//! of these shapes into exactly one `Renamed` event:
//! - `Both` with two paths becomes `Renamed`, unless the halves already
//!   produced it.
//! - `From` is held back until its `To` half arrives. If something else
//!   arrives first, or the rename window passes, the entry moved out of the
//!   directory and is reported as `Deleted`.
//! - `To` without a held `From` means the entry moved in: `Created`.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::event::{ModifyKind, RenameMode};
use notify::{Event, EventKind};

use crate::event::ChangeEvent;
use crate::options::DEFAULT_RENAME_WINDOW;

/// A `From` half waiting for its `To` half.
#[derive(Debug, Clone)]
struct PendingRename {
    tracker: Option<usize>,
    from: PathBuf,
    since: Instant,
}

/// Stateful translator from raw backend events to normalized events.
#[derive(Debug)]
pub struct EventNormalizer {
    root: PathBuf,
    ignore_root_events: bool,
    rename_window: Duration,
    pending: Option<PendingRename>,
    /// Last rename assembled from halves, so a trailing `Both` is not repeated.
    paired: Option<(PathBuf, PathBuf)>,
}

impl EventNormalizer {
    /// Create a normalizer for a watched directory.
    ///
    /// # Arguments
    /// * `root` - The watched directory
    /// * `ignore_root_events` - Drop events about the directory itself
    pub fn new(root: impl Into<PathBuf>, ignore_root_events: bool) -> Self {
        Self {
            root: root.into(),
            ignore_root_events,
            rename_window: DEFAULT_RENAME_WINDOW,
            pending: None,
            paired: None,
        }
    }

    /// Set how long a `From` half waits for its `To` half.
    pub fn with_rename_window(mut self, window: Duration) -> Self {
        self.rename_window = window;
        self
    }

    /// When the held `From` half must be given up, if one is held.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.pending
            .as_ref()
            .map(|pending| pending.since + self.rename_window)
    }

    /// Report a held `From` half as `Deleted` once its window has passed.
    ///
    /// # Arguments
    /// * `now` - Current time
    pub fn expire(&mut self, now: Instant) -> Vec<ChangeEvent> {
        let mut out: Vec<ChangeEvent> = Vec::new();
        if self.next_deadline().is_some_and(|deadline| deadline <= now) {
            self.flush_pending(&mut out);
            self.paired = None;
        }
        self.drop_root_events(out)
    }

    /// Forget any half-seen rename.
    pub fn reset(&mut self) {
        self.pending = None;
        self.paired = None;
    }

    /// Translate one raw event.
    ///
    /// # Returns
    /// Zero or more normalized events, in delivery order.
    pub fn normalize(&mut self, event: &Event) -> Vec<ChangeEvent> {
        let mut out: Vec<ChangeEvent> = Vec::new();

        if let EventKind::Modify(ModifyKind::Name(mode)) = &event.kind {
            self.rename(*mode, event, &mut out);
            return self.drop_root_events(out);
        }

        if matches!(event.kind, EventKind::Access(_) | EventKind::Other) {
            return out;
        }

        self.flush_pending(&mut out);
        self.paired = None;

        for path in &event.paths {
            let normalized: Option<ChangeEvent> = match &event.kind {
                EventKind::Create(_) => Some(ChangeEvent::created(path)),
                EventKind::Remove(_) => Some(ChangeEvent::deleted(path)),
                EventKind::Modify(_) | EventKind::Any => Some(ChangeEvent::changed(path)),
                EventKind::Access(_) | EventKind::Other => None,
            };
            out.extend(normalized);
        }

        self.drop_root_events(out)
    }

    fn rename(&mut self, mode: RenameMode, event: &Event, out: &mut Vec<ChangeEvent>) {
        let tracker: Option<usize> = event.attrs.tracker();

        match mode {
            RenameMode::Both if event.paths.len() >= 2 => {
                self.flush_pending(out);
                let pair: (PathBuf, PathBuf) = (event.paths[0].clone(), event.paths[1].clone());
                if self.paired.as_ref() == Some(&pair) {
                    self.paired = None;
                } else {
                    out.push(ChangeEvent::renamed(pair.0, pair.1));
                }
            }
            RenameMode::From => {
                self.flush_pending(out);
                self.paired = None;
                if let Some(from) = event.paths.first() {
                    self.pending = Some(PendingRename {
                        tracker,
                        from: from.clone(),
                        since: Instant::now(),
                    });
                }
            }
            RenameMode::To => {
                let Some(to) = event.paths.first() else {
                    return;
                };
                match self.pending.take() {
                    Some(pending) if pending.tracker == tracker => {
                        self.paired = Some((pending.from.clone(), to.clone()));
                        out.push(ChangeEvent::renamed(pending.from, to.clone()));
                    }
                    other => {
                        self.pending = other;
                        self.flush_pending(out);
                        self.paired = None;
                        out.push(ChangeEvent::created(to));
                    }
                }
            }
            _ => {
                // Unpaired name change: judge by whether the entry is still there
                self.flush_pending(out);
                self.paired = None;
                for path in &event.paths {
                    if path.exists() {
                        out.push(ChangeEvent::created(path));
                    } else {
                        out.push(ChangeEvent::deleted(path));
                    }
                }
            }
        }
    }

    fn flush_pending(&mut self, out: &mut Vec<ChangeEvent>) {
        if let Some(pending) = self.pending.take() {
            out.push(ChangeEvent::deleted(pending.from));
        }
    }

    fn drop_root_events(&self, mut events: Vec<ChangeEvent>) -> Vec<ChangeEvent> {
        if self.ignore_root_events {
            events.retain(|e| !self.is_root(e.full_path()));
        }
        events
    }

    fn is_root(&self, path: &Path) -> bool {
        path == self.root
    }
}
