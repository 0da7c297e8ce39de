// src/errors.rs

//! Crate-wide error type and result alias.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaylogError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Log serialization error: {0}")]
    SerializeError(#[from] serde_yaml::Error),

    #[error("Malformed event record: {0}")]
    EventParse(#[from] serde_json::Error),

    /// A synchronous log received more writes than its window allows.
    #[error("Rate limit exceeded on log stream '{stream}': more than {limit} writes within {window_secs}s")]
    RateLimitExceeded {
        stream: String,
        limit: u32,
        window_secs: u64,
    },

    /// The automation engine could not be started at all.
    #[error("Run could not start: {0}")]
    RunStart(String),

    /// The event source ended abnormally mid-run.
    #[error("Event source failed: {0}")]
    EventSource(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, PlaylogError>;
