//! Topic-keyed fan-out of change events to connected subscribers.
//!
//! Each subscriber owns a small bounded queue. Publishing snapshots the
//! subscriber list under the lock and delivers outside it with `try_send`,
//! so a stalled client can never hold up the watcher or other clients: a
//! full queue drops that one event for that one subscriber.

use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::{Receiver, RecvTimeoutError, Sender, TrySendError, bounded};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use super::event::ChangeEvent;

/// Per-subscriber queue depth.
const SUBSCRIBER_CAPACITY: usize = 16;

/// Outcome of one [`Broadcaster::publish`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Delivery {
    pub delivered: usize,
    /// Subscribers whose queue was full.
    pub dropped: usize,
}

struct Entry {
    topic: String,
    tx: Sender<ChangeEvent>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    subscribers: FxHashMap<u64, Entry>,
    closed: bool,
}

/// Shared handle to the subscriber registry.
#[derive(Clone, Default)]
pub struct Broadcaster {
    inner: Arc<Mutex<Registry>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a subscriber on `topic`.
    ///
    /// Only events published after this call are delivered. After
    /// [`close`](Self::close) the returned subscription is already ended.
    pub fn subscribe(&self, topic: &str) -> Subscription {
        let (tx, rx) = bounded(SUBSCRIBER_CAPACITY);
        let mut registry = self.inner.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        if !registry.closed {
            registry.subscribers.insert(
                id,
                Entry {
                    topic: topic.to_string(),
                    tx,
                },
            );
        }
        crate::debug!("sse"; "subscriber {} joined `{}`", id, topic);
        Subscription {
            id,
            rx,
            broadcaster: self.clone(),
        }
    }

    /// Deliver `event` to every current subscriber of `topic`.
    pub fn publish(&self, topic: &str, event: &ChangeEvent) -> Delivery {
        let targets: Vec<(u64, Sender<ChangeEvent>)> = {
            let registry = self.inner.lock();
            registry
                .subscribers
                .iter()
                .filter(|(_, entry)| entry.topic == topic)
                .map(|(id, entry)| (*id, entry.tx.clone()))
                .collect()
        };

        let mut delivery = Delivery::default();
        let mut gone = Vec::new();
        for (id, tx) in targets {
            match tx.try_send(event.clone()) {
                Ok(()) => delivery.delivered += 1,
                Err(TrySendError::Full(_)) => {
                    crate::debug!("sse"; "subscriber {} lagging, event dropped", id);
                    delivery.dropped += 1;
                }
                Err(TrySendError::Disconnected(_)) => gone.push(id),
            }
        }

        // a subscription dropped between the snapshot and its send
        if !gone.is_empty() {
            let mut registry = self.inner.lock();
            for id in &gone {
                registry.subscribers.remove(id);
            }
        }
        delivery
    }

    /// Number of live subscribers across all topics.
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }

    /// End every subscription and refuse new ones.
    pub fn close(&self) {
        let mut registry = self.inner.lock();
        registry.closed = true;
        registry.subscribers.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    fn remove(&self, id: u64) {
        if self.inner.lock().subscribers.remove(&id).is_some() {
            crate::debug!("sse"; "subscriber {} left", id);
        }
    }
}

/// Receiving end of one subscriber. Unsubscribes when dropped.
pub struct Subscription {
    id: u64,
    rx: Receiver<ChangeEvent>,
    broadcaster: Broadcaster,
}

/// Result of waiting on a [`Subscription`].
#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    Event(ChangeEvent),
    Idle,
    Closed,
}

impl Subscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Wait up to `timeout` for the next event.
    pub fn next_timeout(&self, timeout: Duration) -> Next {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Next::Event(event),
            Err(RecvTimeoutError::Timeout) => Next::Idle,
            Err(RecvTimeoutError::Disconnected) => Next::Closed,
        }
    }

    /// Event already queued, if any.
    pub fn try_next(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.broadcaster.remove(self.id);
    }
}
