//! Server lifecycle management.

use std::net::SocketAddr;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use crossbeam::channel::{Receiver, Sender};
use tiny_http::Server;

use crate::actor::{Coordinator, WatchError};
use crate::config::WatchConfig;
use crate::core::ServerContext;
use crate::log;
use crate::reload::Broadcaster;

/// Bind the listener. There is no port fallback: a taken port is fatal.
pub fn bind(addr: SocketAddr) -> Result<(Server, SocketAddr)> {
    let server = Server::http(addr).map_err(|e| anyhow!("Failed to bind {addr}: {e}"))?;
    let actual = server.server_addr().to_ip().unwrap_or(addr);
    Ok((server, actual))
}

/// Stops the request loop, the watcher, and every event stream.
#[derive(Clone)]
pub struct ShutdownHandle {
    ctx: Arc<ServerContext>,
    server: Arc<Server>,
    watcher_tx: Sender<()>,
}

impl ShutdownHandle {
    pub fn new(ctx: Arc<ServerContext>, server: Arc<Server>, watcher_tx: Sender<()>) -> Self {
        Self {
            ctx,
            server,
            watcher_tx,
        }
    }

    pub fn trigger(&self) {
        self.ctx.begin_shutdown();
        let _ = self.watcher_tx.send(());
        self.server.unblock();
    }

    /// Run [`trigger`](Self::trigger) on Ctrl+C.
    pub fn install(self) -> Result<()> {
        ctrlc::set_handler(move || {
            log!("serve"; "shutting down");
            self.trigger();
        })
        .context("Failed to set Ctrl+C handler")
    }
}

/// Spawn the watcher actors on their own runtime thread.
///
/// A watcher error terminates the process.
pub fn spawn_watcher(
    config: &WatchConfig,
    broadcaster: &Broadcaster,
    shutdown_rx: Receiver<()>,
) -> Option<JoinHandle<()>> {
    if !config.enable {
        return None;
    }

    let config = config.clone();
    let broadcaster = broadcaster.clone();
    Some(thread::spawn(move || {
        if let Err(e) = run_watcher(config, broadcaster, shutdown_rx) {
            log!("error"; "{:#}", anyhow::Error::new(e));
            std::process::exit(1);
        }
    }))
}

fn run_watcher(
    config: WatchConfig,
    broadcaster: Broadcaster,
    shutdown_rx: Receiver<()>,
) -> Result<(), WatchError> {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .map_err(WatchError::Runtime)?;

    rt.block_on(
        Coordinator::new(config, broadcaster)
            .with_shutdown_signal(shutdown_rx)
            .run(),
    )
}

/// Wait for the watcher to stop (max 2 seconds).
pub fn wait_for_shutdown(handle: Option<JoinHandle<()>>) {
    let Some(handle) = handle else { return };

    for _ in 0..40 {
        if handle.is_finished() {
            let _ = handle.join();
            return;
        }
        thread::sleep(Duration::from_millis(50));
    }
}
