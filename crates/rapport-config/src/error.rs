//! Config error type.

use thiserror::Error;

/// Errors produced while reading, merging, or validating a Rapport config.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file: {0}")]
    ReadFailed(#[from] std::io::Error),
    #[error("config is not valid JSON5: {0}")]
    ParseFailed(#[from] json5::Error),
    #[error("config does not match the expected shape: {0}")]
    DecodeFailed(#[from] serde_json::Error),
    /// A single field failed schema validation; `path` is `layer:dotted.path`.
    #[error("invalid config at {path}: {message}")]
    InvalidField { path: String, message: String },
    /// A cross-field invariant does not hold.
    #[error("invalid config: {0}")]
    Invalid(String),
}
