use std::path::PathBuf;
use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;

/// Sleep used while no window is open.
const IDLE_SLEEP: Duration = Duration::from_secs(86400);

/// Fixed-window debouncer: pure timing, no I/O.
///
/// The first write opens a window of `window` length; every write until
/// it closes joins the same batch. The batch is released by time alone,
/// so a burst followed by silence still flushes. Callers pass `now` in so
/// the timing can be tested without sleeping.
pub(super) struct Debouncer {
    window: Duration,
    opened: Option<Instant>,
    paths: FxHashSet<PathBuf>,
    events: usize,
}

/// Writes coalesced by one window.
#[derive(Debug, PartialEq, Eq)]
pub(super) struct Batch {
    pub(super) events: usize,
    /// Distinct paths, sorted.
    pub(super) paths: Vec<PathBuf>,
}

impl Debouncer {
    pub(super) fn new(window: Duration) -> Self {
        Self {
            window,
            opened: None,
            paths: FxHashSet::default(),
            events: 0,
        }
    }

    /// Record one accepted write event.
    pub(super) fn record<I>(&mut self, paths: I, now: Instant)
    where
        I: IntoIterator<Item = PathBuf>,
    {
        if self.opened.is_none() {
            self.opened = Some(now);
        }
        self.events += 1;
        self.paths.extend(paths);
    }

    /// When the open window closes, if one is open.
    pub(super) fn deadline(&self) -> Option<Instant> {
        self.opened.map(|opened| opened + self.window)
    }

    /// Time to sleep before the next possible flush.
    pub(super) fn sleep_duration(&self, now: Instant) -> Duration {
        match self.deadline() {
            Some(deadline) => deadline
                .saturating_duration_since(now)
                .max(Duration::from_millis(1)),
            None => IDLE_SLEEP,
        }
    }

    /// Release the batch once its window has closed.
    pub(super) fn take_if_ready(&mut self, now: Instant) -> Option<Batch> {
        let deadline = self.deadline()?;
        if now < deadline {
            return None;
        }

        self.opened = None;
        let mut paths: Vec<_> = std::mem::take(&mut self.paths).into_iter().collect();
        paths.sort();
        Some(Batch {
            events: std::mem::take(&mut self.events),
            paths,
        })
    }
}
