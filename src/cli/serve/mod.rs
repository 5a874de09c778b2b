//! Development server with live reload support.
//!
//! ```text
//! /watch     ─► event stream (held open on its thread)
//! /assets/*  ─► ./assets, caching disabled
//! *          ─► route::resolve ─► entry page | runtime script | build | static file
//! ```

mod compile;
mod lifecycle;
mod response;
mod route;


pub use lifecycle::ShutdownHandle;

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use anyhow::Result;
use crossbeam::channel;
use tiny_http::{Request, Server};

use crate::core::ServerContext;
use crate::embed::serve::WATCH_PATH;
use crate::reload::{CHANGE_TOPIC, stream};
use crate::utils::{mime::types::HTML, url};
use crate::{debug, log};

use response::Reply;
use route::Route;

/// URL prefix of the no-cache static asset tree.
const ASSETS_PREFIX: &str = "/assets/";

/// Directory under the working directory served at [`ASSETS_PREFIX`].
const ASSETS_DIR: &str = "assets";

/// Bound server ready to accept requests
pub struct BoundServer {
    server: Arc<Server>,
    addr: SocketAddr,
    ctx: Arc<ServerContext>,
    shutdown_tx: channel::Sender<()>,
    shutdown_rx: channel::Receiver<()>,
}

/// Bind the HTTP server without starting the request loop
pub fn bind_server(ctx: Arc<ServerContext>) -> Result<BoundServer> {
    let (server, addr) = lifecycle::bind(ctx.config.addr)?;
    let (shutdown_tx, shutdown_rx) = channel::unbounded::<()>();

    Ok(BoundServer {
        server: Arc::new(server),
        addr,
        ctx,
        shutdown_tx,
        shutdown_rx,
    })
}

impl BoundServer {
    /// Get the bound address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Handle that stops this server from another thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle::new(
            Arc::clone(&self.ctx),
            Arc::clone(&self.server),
            self.shutdown_tx.clone(),
        )
    }

    /// Start the watcher and the request loop (blocking).
    pub fn run(self) -> Result<()> {
        log!("serve"; "http://{}", display_addr(self.addr));

        let watcher = lifecycle::spawn_watcher(
            &self.ctx.config.watch,
            &self.ctx.broadcaster,
            self.shutdown_rx,
        );
        run_request_loop(&self.server, &self.ctx);
        lifecycle::wait_for_shutdown(watcher);
        Ok(())
    }
}

/// Loopback address for unspecified binds, so the logged URL is clickable.
fn display_addr(addr: SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("localhost:{}", addr.port())
    } else {
        addr.to_string()
    }
}

/// Accept loop. Every request gets its own thread: a build holds its
/// thread until the compiler exits and must not delay any other request.
fn run_request_loop(server: &Server, ctx: &Arc<ServerContext>) {
    for request in server.incoming_requests() {
        let ctx = Arc::clone(ctx);
        let watch = url::path_only(request.url()) == WATCH_PATH;
        let name = if watch { "sse" } else { "request" };
        let spawned = std::thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                if watch {
                    handle_watch(request, &ctx);
                } else if let Err(e) = handle_request(request, &ctx) {
                    log!("serve"; "request error: {e:#}");
                }
            });
        if let Err(e) = spawned {
            log!("serve"; "cannot spawn request thread: {e}");
        }
    }
    debug!("serve"; "request loop stopped");
}

/// Handle a single HTTP request
fn handle_request(request: Request, ctx: &ServerContext) -> Result<()> {
    if ctx.is_shutdown() {
        return response::send(request, Reply::unavailable(), ctx.allow_origin());
    }

    let reply = match request.url().strip_prefix(ASSETS_PREFIX) {
        Some(rest) => serve_asset(rest, &ctx.root().join(ASSETS_DIR)),
        None => serve_route(request.url(), ctx),
    };

    debug!("serve"; "{} {} {}", request.method(), request.url(), reply.status);
    response::send(request, reply, ctx.allow_origin())
}

fn serve_route(target: &str, ctx: &ServerContext) -> Reply {
    let route = match route::resolve(target, ctx.root()) {
        Ok(route) => route,
        Err(e) => return Reply::error(500, &e.to_string()),
    };

    match route {
        Route::Redirect(location) => Reply::see_other(&location),
        Route::Index => Reply::ok(HTML, ctx.index_html.as_bytes()),
        Route::RuntimeScript => match &ctx.runtime_script {
            Some(path) => file_reply(path),
            None => Reply::not_found(),
        },
        Route::Artifact => compile::serve_artifact(&ctx.builder),
        Route::Static(path) => file_reply(&path),
        Route::NotFound => Reply::not_found(),
    }
}

/// Serve from the assets directory with caching disabled.
fn serve_asset(rest: &str, dir: &Path) -> Reply {
    let path = url::decode(url::path_only(rest))
        .and_then(|decoded| url::join_under(dir, &decoded));
    let reply = match path {
        Some(path) if path.is_dir() => file_reply(&path.join(route::INDEX_NAME)),
        Some(path) => file_reply(&path),
        None => Reply::not_found(),
    };
    reply.no_cache()
}

fn file_reply(path: &Path) -> Reply {
    Reply::file(path).unwrap_or_else(|e| Reply::error(500, &format!("{e:#}")))
}

/// Hold the connection open and stream change events to it.
fn handle_watch(request: Request, ctx: &ServerContext) {
    if ctx.is_shutdown() {
        let _ = response::send(request, Reply::unavailable(), ctx.allow_origin());
        return;
    }

    // Subscribe before the head goes out so no event slips between them
    let subscription = ctx.broadcaster.subscribe(CHANGE_TOPIC);
    debug!("sse"; "client connected: {:?}", request.remote_addr());

    let writer = request.into_writer();
    stream::serve(
        writer,
        subscription,
        ctx.allow_origin(),
        stream::KEEP_ALIVE_INTERVAL,
    );
}
