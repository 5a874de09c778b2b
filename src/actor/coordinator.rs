//! Actor Coordinator - wires the watcher to the broadcaster.
//!
//! Creates the channel between the two actors, runs them, and tears both
//! down on shutdown or on the first watcher error.

use std::time::Duration;

use crossbeam::channel::{Receiver, TryRecvError};
use tokio::sync::mpsc;
use tokio::task::JoinError;

use super::error::WatchError;
use super::fs::FsActor;
use super::messages::PublishMsg;
use super::publish::PublishActor;
use crate::config::WatchConfig;
use crate::reload::Broadcaster;

const CHANNEL_BUFFER: usize = 32;

/// How often the shutdown signal is polled.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

/// Coordinator - wires up and runs the actor system.
pub struct Coordinator {
    config: WatchConfig,
    broadcaster: Broadcaster,
    shutdown_rx: Option<Receiver<()>>,
}

impl Coordinator {
    pub fn new(config: WatchConfig, broadcaster: Broadcaster) -> Self {
        Self {
            config,
            broadcaster,
            shutdown_rx: None,
        }
    }

    /// Set shutdown signal receiver.
    pub fn with_shutdown_signal(mut self, rx: Receiver<()>) -> Self {
        self.shutdown_rx = Some(rx);
        self
    }

    /// Run until shutdown. A watcher error ends the run with `Err`.
    pub async fn run(self) -> Result<(), WatchError> {
        let (publish_tx, publish_rx) = mpsc::channel::<PublishMsg>(CHANNEL_BUFFER);

        let fs_actor = FsActor::new(&self.config, publish_tx.clone())?;
        let publish_actor = PublishActor::new(publish_rx, self.broadcaster);

        let publish_handle = tokio::spawn(publish_actor.run());
        let mut fs_handle = tokio::spawn(fs_actor.run());

        crate::debug!("watch"; "start");
        let result = tokio::select! {
            joined = &mut fs_handle => settle(joined),
            _ = wait_for_signal(self.shutdown_rx) => {
                crate::debug!("watch"; "shutdown signal received");
                fs_handle.abort();
                Ok(())
            }
        };

        let _ = publish_tx.send(PublishMsg::Shutdown).await;
        let _ = tokio::time::timeout(Duration::from_millis(500), publish_handle).await;

        crate::debug!("watch"; "stopped");
        result
    }
}

/// Outcome of a watcher task that ended on its own. A panic or
/// cancellation is as fatal as a watcher error.
fn settle(joined: Result<Result<(), WatchError>, JoinError>) -> Result<(), WatchError> {
    joined.map_err(WatchError::Task)?
}

/// Resolve once the shutdown sender fires or goes away; never without one.
async fn wait_for_signal(rx: Option<Receiver<()>>) {
    let Some(rx) = rx else {
        return std::future::pending().await;
    };
    loop {
        match rx.try_recv() {
            Ok(()) | Err(TryRecvError::Disconnected) => return,
            Err(TryRecvError::Empty) => tokio::time::sleep(SHUTDOWN_POLL).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEBOUNCE_WINDOW;
    use tempfile::TempDir;

    fn config(root: &std::path::Path) -> WatchConfig {
        WatchConfig {
            enable: true,
            root: root.to_path_buf(),
            poll: false,
            interval: Duration::from_millis(200),
            debounce: DEBOUNCE_WINDOW,
            ignore: Vec::new(),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_shutdown_signal_stops_run() {
        let temp = TempDir::new().unwrap();
        let (tx, rx) = crossbeam::channel::unbounded();
        let coordinator =
            Coordinator::new(config(temp.path()), Broadcaster::new()).with_shutdown_signal(rx);

        let handle = tokio::spawn(coordinator.run());
        tx.send(()).unwrap();

        let result = tokio::time::timeout(Duration::from_secs(3), handle)
            .await
            .expect("coordinator did not stop")
            .unwrap();
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_panicked_watcher_task_is_fatal() {
        let joined = tokio::spawn(async {
            if true {
                panic!("watcher blew up");
            }
            Ok::<(), WatchError>(())
        })
        .await;
        assert!(matches!(settle(joined), Err(WatchError::Task(e)) if e.is_panic()));
    }

    #[tokio::test]
    async fn test_cancelled_watcher_task_is_fatal() {
        let handle = tokio::spawn(async {
            std::future::pending::<()>().await;
            Ok::<(), WatchError>(())
        });
        handle.abort();
        assert!(matches!(settle(handle.await), Err(WatchError::Task(e)) if e.is_cancelled()));
    }

    #[tokio::test]
    async fn test_watcher_result_passes_through() {
        let ok = tokio::spawn(async { Ok::<(), WatchError>(()) }).await;
        assert!(settle(ok).is_ok());

        let failed = tokio::spawn(async {
            Err::<(), WatchError>(WatchError::Runtime(std::io::Error::other("gone")))
        })
        .await;
        assert!(matches!(settle(failed), Err(WatchError::Runtime(_))));
    }

    #[tokio::test]
    async fn test_attach_failure_is_reported() {
        let temp = TempDir::new().unwrap();
        let coordinator =
            Coordinator::new(config(&temp.path().join("missing")), Broadcaster::new());
        assert!(matches!(
            coordinator.run().await,
            Err(WatchError::Attach(..))
        ));
    }
}
