//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Serve a Go program compiled to WebAssembly, rebuilding it on every load
/// and reloading connected browsers when sources change.
#[derive(Parser, Debug, Clone, Default)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Package or directory to build (default: current directory)
    #[arg(value_name = "PACKAGE")]
    pub package: Option<String>,

    /// HTTP bind address to serve (e.g., :9900, 127.0.0.1:8080)
    #[arg(long)]
    pub http: Option<String>,

    /// Build tags passed to `go build -tags` (comma-separated)
    #[arg(long)]
    pub tags: Option<String>,

    /// Allow specified origin (or * for all origins) to make requests to this server
    #[arg(long = "allow-origin")]
    pub allow_origin: Option<String>,

    /// Config file path (default: wasmserve.toml, if present)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Enable file watching for live reload
    #[arg(short, long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub watch: Option<bool>,

    /// Poll the file system instead of using OS notifications
    #[arg(long, action = clap::ArgAction::Set, num_args = 0..=1, default_missing_value = "true", require_equals = false)]
    pub poll: Option<bool>,

    /// Polling interval in milliseconds (only with --poll)
    #[arg(long, value_name = "MS")]
    pub interval: Option<u64>,

    /// Enable verbose output for debugging
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_short_flags() {
        let cli = Cli::parse_from(["wasmserve", "-v", "-C", "dev.toml"]);
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("dev.toml")));
    }

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["wasmserve"]);
        assert_eq!(cli.package, None);
        assert_eq!(cli.http, None);
        assert_eq!(cli.tags, None);
        assert_eq!(cli.allow_origin, None);
        assert_eq!(cli.watch, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_flags_and_package() {
        let cli = Cli::parse_from([
            "wasmserve",
            "--http",
            ":8080",
            "--tags",
            "example,ebitenginedebug",
            "--allow-origin",
            "*",
            "./cmd/game",
        ]);
        assert_eq!(cli.http.as_deref(), Some(":8080"));
        assert_eq!(cli.tags.as_deref(), Some("example,ebitenginedebug"));
        assert_eq!(cli.allow_origin.as_deref(), Some("*"));
        assert_eq!(cli.package.as_deref(), Some("./cmd/game"));
    }

    #[test]
    fn test_optional_bool_flags() {
        let cli = Cli::parse_from(["wasmserve", "--poll", "--watch", "false"]);
        assert_eq!(cli.poll, Some(true));
        assert_eq!(cli.watch, Some(false));
    }
}
