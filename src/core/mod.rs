//! Shared server state.
//!
//! One [`ServerContext`] is built at startup and handed by reference to
//! every request handler; nothing here is global.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use crate::compiler::Builder;
use crate::config::ServeConfig;
use crate::embed::serve::index_html;
use crate::reload::Broadcaster;

/// Everything a request handler needs.
pub struct ServerContext {
    pub config: ServeConfig,
    pub builder: Builder,
    pub broadcaster: Broadcaster,
    /// Rendered entry page.
    pub index_html: String,
    /// Toolchain runtime support script, if one was found.
    pub runtime_script: Option<PathBuf>,
    /// Shutdown has been requested (Ctrl+C received)
    shutdown: AtomicBool,
}

impl ServerContext {
    pub fn new(
        config: ServeConfig,
        builder: Builder,
        broadcaster: Broadcaster,
        runtime_script: Option<PathBuf>,
    ) -> Self {
        Self {
            config,
            builder,
            broadcaster,
            index_html: index_html(),
            runtime_script,
            shutdown: AtomicBool::new(false),
        }
    }

    /// Directory static files are served from.
    pub fn root(&self) -> &Path {
        &self.config.root
    }

    pub fn allow_origin(&self) -> Option<&str> {
        self.config.allow_origin.as_deref()
    }

    /// Refuse new work and end every event stream.
    pub fn begin_shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.broadcaster.close();
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }
}
