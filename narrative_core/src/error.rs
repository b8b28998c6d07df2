//! Error types for the fallible boundaries of the narrative core.
//!
//! History, assembly and validation never fail; only loading configuration and
//! talking to the text generator can.

use thiserror::Error;

/// Configuration loading and checking errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors reported by the text-generation collaborator.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("generator unavailable: {0}")]
    Unavailable(String),

    #[error("generation rejected by provider: {0}")]
    Rejected(String),

    #[error("generation timed out")]
    Timeout,
}
