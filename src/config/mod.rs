//! Server configuration.
//!
//! Values come from three layers, highest priority first:
//! 1. Command-line flags
//! 2. `wasmserve.toml` (or the file given with `--config`)
//! 3. Built-in defaults
//!
//! The resolved [`ServeConfig`] is immutable for the process lifetime.

mod error;
mod section;

pub use error::ConfigError;
pub use section::FileConfig;

use std::net::{SocketAddr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cli::Cli;

/// Default HTTP bind address (all interfaces).
pub const DEFAULT_HTTP: &str = ":9900";

/// Config file looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = "wasmserve.toml";

/// Fixed debounce window for change notifications.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_secs(1);

/// Resolved server configuration.
#[derive(Debug, Clone)]
pub struct ServeConfig {
    /// Address the HTTP listener binds to.
    pub addr: SocketAddr,
    /// Working directory: static files, build directory and watch root.
    pub root: PathBuf,
    /// Package passed to `go build` (`.` by default).
    pub package: String,
    /// Comma-separated build tags, if any.
    pub tags: Option<String>,
    /// `Access-Control-Allow-Origin` value, if any.
    pub allow_origin: Option<String>,
    pub watch: WatchConfig,
}

/// File watcher settings.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    pub enable: bool,
    /// Directory watched recursively.
    pub root: PathBuf,
    /// Poll instead of relying on OS notification primitives.
    pub poll: bool,
    /// Poll interval (ignored by OS-notification watchers).
    pub interval: Duration,
    /// Window during which write events are coalesced.
    pub debounce: Duration,
    /// Path components that never trigger a notification.
    pub ignore: Vec<String>,
}

impl ServeConfig {
    /// Load configuration for the current working directory.
    pub fn load(cli: &Cli) -> Result<Self, ConfigError> {
        let root = std::env::current_dir().map_err(ConfigError::WorkingDir)?;
        let file = read_file_config(cli.config.as_deref(), &root)?;
        Self::resolve(cli, file, root)
    }

    /// Merge CLI flags over file values over defaults.
    pub fn resolve(cli: &Cli, file: FileConfig, root: PathBuf) -> Result<Self, ConfigError> {
        let http = cli
            .http
            .clone()
            .or(file.serve.http)
            .unwrap_or_else(|| DEFAULT_HTTP.to_string());

        let watch = WatchConfig {
            enable: cli.watch.unwrap_or(file.watch.enable),
            root: root.clone(),
            poll: cli.poll.unwrap_or(file.watch.poll),
            interval: Duration::from_millis(cli.interval.unwrap_or(file.watch.interval_ms).max(1)),
            debounce: DEBOUNCE_WINDOW,
            ignore: file.watch.ignore,
        };

        Ok(Self {
            addr: parse_bind_addr(&http)?,
            root,
            package: non_empty(cli.package.clone()).unwrap_or_else(|| ".".to_string()),
            tags: non_empty(cli.tags.clone().or(file.serve.tags)),
            allow_origin: non_empty(cli.allow_origin.clone().or(file.serve.allow_origin))
                .map(validate_header_value)
                .transpose()?,
            watch,
        })
    }
}

/// Read the config file, if any.
///
/// An explicit `--config` path must exist; the default file is optional.
fn read_file_config(explicit: Option<&Path>, root: &Path) -> Result<FileConfig, ConfigError> {
    let path = match explicit {
        Some(path) => root.join(path),
        None => {
            let path = root.join(DEFAULT_CONFIG_FILE);
            if !path.is_file() {
                return Ok(FileConfig::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
    toml::from_str(&content).map_err(|e| ConfigError::Toml(path, e))
}

/// Parse a bind address.
///
/// Accepts `host:port` and the `:port` shorthand for all interfaces.
pub fn parse_bind_addr(value: &str) -> Result<SocketAddr, ConfigError> {
    let full = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };

    full.to_socket_addrs()
        .map_err(|e| ConfigError::Address(value.to_string(), e.to_string()))?
        .next()
        .ok_or_else(|| ConfigError::Address(value.to_string(), "no address resolved".into()))
}

/// Header values are written into raw response heads: printable ASCII only.
fn validate_header_value(value: String) -> Result<String, ConfigError> {
    if value.bytes().all(|b| b.is_ascii() && !b.is_ascii_control()) {
        Ok(value)
    } else {
        Err(ConfigError::HeaderValue(value))
    }
}

/// Empty strings mean "unset" for optional flags.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
    use tempfile::TempDir;

    fn resolve(cli: &Cli, file: &str) -> ServeConfig {
        let file: FileConfig = toml::from_str(file).unwrap();
        ServeConfig::resolve(cli, file, PathBuf::from("/work")).unwrap()
    }

    #[test]
    fn test_parse_bind_addr_port_only() {
        let addr = parse_bind_addr(":9900").unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::UNSPECIFIED));
        assert_eq!(addr.port(), 9900);
    }

    #[test]
    fn test_parse_bind_addr_host_port() {
        let addr = parse_bind_addr("127.0.0.1:8080").unwrap();
        assert_eq!(addr.ip(), IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(addr.port(), 8080);

        let addr = parse_bind_addr("[::1]:9000").unwrap();
        assert_eq!(addr.ip(), IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[test]
    fn test_parse_bind_addr_invalid() {
        assert!(matches!(
            parse_bind_addr("not-an-address"),
            Err(ConfigError::Address(..))
        ));
        assert!(parse_bind_addr(":99999").is_err());
    }

    #[test]
    fn test_defaults() {
        let config = resolve(&Cli::default(), "");
        assert_eq!(config.addr.port(), 9900);
        assert_eq!(config.package, ".");
        assert_eq!(config.tags, None);
        assert_eq!(config.allow_origin, None);
        assert!(config.watch.enable);
        assert_eq!(config.watch.root, PathBuf::from("/work"));
        assert_eq!(config.watch.interval, Duration::from_millis(200));
        assert_eq!(config.watch.debounce, Duration::from_secs(1));
    }

    #[test]
    fn test_cli_overrides_file() {
        let cli = Cli {
            http: Some("127.0.0.1:7000".into()),
            tags: Some("cli".into()),
            watch: Some(false),
            ..Default::default()
        };
        let config = resolve(
            &cli,
            "[serve]\nhttp = \":8000\"\ntags = \"file\"\nallow_origin = \"*\"\n[watch]\nenable = true",
        );
        assert_eq!(config.addr.port(), 7000);
        assert_eq!(config.tags.as_deref(), Some("cli"));
        assert_eq!(config.allow_origin.as_deref(), Some("*"));
        assert!(!config.watch.enable);
    }

    #[test]
    fn test_empty_values_disable() {
        let cli = Cli {
            tags: Some(String::new()),
            allow_origin: Some(String::new()),
            package: Some(String::new()),
            ..Default::default()
        };
        let config = resolve(&cli, "");
        assert_eq!(config.tags, None);
        assert_eq!(config.allow_origin, None);
        assert_eq!(config.package, ".");
    }

    #[test]
    fn test_allow_origin_must_be_header_safe() {
        let file: FileConfig = toml::from_str("").unwrap();
        for bad in ["*\r\nSet-Cookie: a=b", "http://a\nb", "caf\u{e9}"] {
            let cli = Cli {
                allow_origin: Some(bad.into()),
                ..Default::default()
            };
            let err = ServeConfig::resolve(&cli, file.clone(), PathBuf::from("/work")).unwrap_err();
            assert!(matches!(err, ConfigError::HeaderValue(v) if v == bad));
        }

        let from_file = toml::from_str::<FileConfig>("[serve]\nallow_origin = \"a\\r\\nb\"").unwrap();
        assert!(ServeConfig::resolve(&Cli::default(), from_file, PathBuf::from("/work")).is_err());

        let ok = resolve(
            &Cli {
                allow_origin: Some("http://localhost:3000".into()),
                ..Default::default()
            },
            "",
        );
        assert_eq!(ok.allow_origin.as_deref(), Some("http://localhost:3000"));
    }

    #[test]
    fn test_read_file_config_missing_default_is_ok() {
        let temp = TempDir::new().unwrap();
        let config = read_file_config(None, temp.path()).unwrap();
        assert!(config.watch.enable);
    }

    #[test]
    fn test_read_file_config_explicit_missing_fails() {
        let temp = TempDir::new().unwrap();
        let err = read_file_config(Some(Path::new("nope.toml")), temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_read_file_config_default_file() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(DEFAULT_CONFIG_FILE),
            "[serve]\ntags = \"debug\"",
        )
        .unwrap();
        let config = read_file_config(None, temp.path()).unwrap();
        assert_eq!(config.serve.tags.as_deref(), Some("debug"));
    }

    #[test]
    fn test_read_file_config_parse_error() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join(DEFAULT_CONFIG_FILE), "[serve\n").unwrap();
        let err = read_file_config(None, temp.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(..)));
    }
}
