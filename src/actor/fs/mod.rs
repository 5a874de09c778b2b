//! FileSystem Actor
//!
//! Watches the working tree for writes and forwards one [`ChangeBatch`] per
//! closed debounce window to the publish actor.
//!
//! Architecture:
//! ```text
//! Watcher → bridge thread → filter → Debouncer (pure timing) → PublishMsg
//! ```

use std::time::{Instant, SystemTime};

use notify::{PollWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use super::error::WatchError;
use super::messages::{ChangeBatch, PublishMsg};
use crate::config::WatchConfig;

// Pure timing.
mod debouncer;
// Write-kind and noise filtering.
mod filter;


use debouncer::Debouncer;
use filter::{PathFilter, is_write};

/// Raw events buffered between the notify thread and the actor.
const EVENT_BUFFER: usize = 64;

/// FileSystem Actor - watches for writes below the root
pub struct FsActor {
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    /// Watcher handle (must be kept alive)
    _watcher: Box<dyn Watcher + Send>,
    publish_tx: mpsc::Sender<PublishMsg>,
    debouncer: Debouncer,
    filter: PathFilter,
}

impl FsActor {
    /// Start watching immediately; events buffer until [`run`](Self::run).
    pub fn new(config: &WatchConfig, publish_tx: mpsc::Sender<PublishMsg>) -> Result<Self, WatchError> {
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let handler = move |res: notify::Result<notify::Event>| {
            let _ = notify_tx.send(res);
        };

        let mut watcher: Box<dyn Watcher + Send> = if config.poll {
            let poll_config = notify::Config::default().with_poll_interval(config.interval);
            Box::new(PollWatcher::new(handler, poll_config).map_err(WatchError::Init)?)
        } else {
            Box::new(notify::recommended_watcher(handler).map_err(WatchError::Init)?)
        };

        watcher
            .watch(&config.root, RecursiveMode::Recursive)
            .map_err(|e| WatchError::Attach(config.root.clone(), e))?;

        crate::debug!(
            "watch";
            "{} ({})",
            config.root.display(),
            if config.poll { "polling" } else { "native" }
        );

        Ok(Self {
            notify_rx,
            _watcher: watcher,
            publish_tx,
            debouncer: Debouncer::new(config.debounce),
            filter: PathFilter::new(&config.root, config.ignore.clone()),
        })
    }

    /// Run the actor event loop.
    ///
    /// Returns `Ok` when the publish actor goes away and `Err` on the first
    /// watcher error.
    pub async fn run(self) -> Result<(), WatchError> {
        let Self {
            notify_rx,
            _watcher,
            publish_tx,
            mut debouncer,
            filter,
        } = self;

        let (async_tx, mut async_rx) =
            mpsc::channel::<notify::Result<notify::Event>>(EVENT_BUFFER);

        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                if async_tx.blocking_send(result).is_err() {
                    break;
                }
            }
        });

        loop {
            tokio::select! {
                biased;
                received = async_rx.recv() => match received {
                    Some(Ok(event)) => accept(&mut debouncer, &filter, event),
                    Some(Err(e)) => return Err(WatchError::Notify(e)),
                    None => return Ok(()),
                },
                _ = tokio::time::sleep(debouncer.sleep_duration(Instant::now())) => {
                    let Some(batch) = debouncer.take_if_ready(Instant::now()) else {
                        continue;
                    };
                    let msg = PublishMsg::Change(ChangeBatch {
                        events: batch.events,
                        paths: batch.paths,
                        closed_at: SystemTime::now(),
                    });
                    if publish_tx.send(msg).await.is_err() {
                        return Ok(());
                    }
                }
            }
        }
    }
}

/// Feed one raw notify event through the filters into the debouncer.
fn accept(debouncer: &mut Debouncer, filter: &PathFilter, event: notify::Event) {
    if !is_write(&event.kind) {
        return;
    }
    let paths: Vec<_> = event
        .paths
        .into_iter()
        .filter(|p| filter.accepts(p))
        .collect();
    if paths.is_empty() {
        return;
    }
    for path in &paths {
        crate::debug!("watch"; "write {}", path.display());
    }
    debouncer.record(paths, Instant::now());
}
