//! Error types shared across the library.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs.

use thiserror::Error;

/// Errors raised while reading from an external collaborator
/// (entity registry, memory runtime, process stats, probes, monitor).
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("collaborator unavailable: {0}")]
    Unavailable(String),

    #[error("not supported by this runtime: {0}")]
    Unsupported(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot JSON invalid: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur while loading or validating configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Config TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
