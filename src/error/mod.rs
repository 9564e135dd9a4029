//! Error types for modelprobe.
//!
//! Expected probe outcomes (timeouts, HTTP error statuses, unsupported
//! features) are never errors; they travel as [`crate::probe::ProbeResponse`]
//! and [`crate::probe::ProbeAttemptResult`] values. `ProbeError` covers
//! caller mistakes and boundary failures only.

pub mod kind;

pub use kind::FailureKind;

use thiserror::Error;

/// Primary error type for all modelprobe operations.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Provider {0} requires an API key")]
    MissingApiKey(String),

    #[error("Provider {0} requires an endpoint")]
    MissingEndpoint(String),

    #[error("Invalid cache key: {0}")]
    InvalidCacheKey(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Probe cancelled")]
    Cancelled,
}

impl ProbeError {
    /// Whether this error came from a cancelled run rather than a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, ProbeError>;
