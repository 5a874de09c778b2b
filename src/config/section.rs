//! Config file sections.
//!
//! # Example
//!
//! ```toml
//! [serve]
//! http = ":9900"              # HTTP bind address
//! tags = "example"            # go build -tags
//! allow_origin = "*"          # Access-Control-Allow-Origin value
//!
//! [watch]
//! enable = true               # Live reload on file writes
//! poll = false                # Poll instead of OS notifications
//! interval_ms = 200           # Poll interval
//! ignore = [".git", "target"] # Path components that never trigger a reload
//! ```

use serde::Deserialize;

/// Root of `wasmserve.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub serve: ServeSection,
    pub watch: WatchSection,
}

/// `[serve]` section. Unset fields fall back to CLI defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServeSection {
    pub http: Option<String>,
    pub tags: Option<String>,
    pub allow_origin: Option<String>,
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatchSection {
    /// Enable file watcher for live reload.
    pub enable: bool,

    /// Use a polling watcher instead of OS notification primitives.
    pub poll: bool,

    /// Poll interval in milliseconds.
    pub interval_ms: u64,

    /// Path components ignored by the watcher.
    pub ignore: Vec<String>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            enable: true,
            poll: false,
            interval_ms: 200,
            ignore: vec![".git".into(), "target".into()],
        }
    }
}
