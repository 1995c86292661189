//! Error types.
//!
//! Only configuration problems surface to callers as errors. Completion
//! errors stay inside the analyzer, which turns them into an absent
//! diagnosis after logging.

use std::path::PathBuf;

use thiserror::Error;

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("API key is required")]
    MissingApiKey,

    #[error("Invalid configuration value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

impl ConfigError {
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Errors from the remote completion service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompletionError {
    #[error("Rate limited by completion service: {message}")]
    RateLimited { message: String },

    #[error("Completion service error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Connection to completion service failed: {0}")]
    Connection(String),

    #[error("Completion request rejected (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Invalid response from completion service: {0}")]
    InvalidResponse(String),
}

impl CompletionError {
    /// Whether another attempt may succeed after a backoff delay.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            CompletionError::RateLimited { .. }
                | CompletionError::Api { .. }
                | CompletionError::Connection(_)
        )
    }

    /// Classify a non-success HTTP status.
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => CompletionError::RateLimited { message },
            408 | 409 | 500..=599 => CompletionError::Api { status, message },
            _ => CompletionError::Rejected { status, message },
        }
    }
}
