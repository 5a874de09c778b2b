//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error in `{0}`")]
    Toml(PathBuf, #[source] toml::de::Error),

    #[error("Invalid header value `{0}`: only printable ASCII is allowed")]
    HeaderValue(String),

    #[error("Invalid bind address `{0}`: {1}")]
    Address(String, String),

    #[error("Cannot determine working directory")]
    WorkingDir(#[source] std::io::Error),
}
