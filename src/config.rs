//! Assistant configuration.
//!
//! Loaded from JSON; every field except `api_key` has a default.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_MODEL_NAME: &str = "gpt-3.5-turbo";
pub const DEFAULT_LOG_PATH: &str = "/config/home-assistant.log";
pub const DEFAULT_SCAN_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssistantConfig {
    pub api_key: String,
    #[serde(default = "default_model_name")]
    pub model_name: String,
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Seconds between periodic scans.
    #[serde(default = "default_scan_interval")]
    pub scan_interval: u64,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_model_name() -> String {
    DEFAULT_MODEL_NAME.to_string()
}

fn default_log_path() -> PathBuf {
    PathBuf::from(DEFAULT_LOG_PATH)
}

fn default_scan_interval() -> u64 {
    DEFAULT_SCAN_INTERVAL_SECS
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_request_timeout() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl AssistantConfig {
    /// Configuration with defaults for everything but the key.
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model_name: default_model_name(),
            log_path: default_log_path(),
            scan_interval: default_scan_interval(),
            api_base: default_api_base(),
            request_timeout: default_request_timeout(),
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        if self.model_name.trim().is_empty() {
            return Err(ConfigError::invalid_value("model_name", "must not be empty"));
        }
        if self.scan_interval == 0 {
            return Err(ConfigError::invalid_value("scan_interval", "must be positive"));
        }
        if self.request_timeout == 0 {
            return Err(ConfigError::invalid_value("request_timeout", "must be positive"));
        }
        if !(self.api_base.starts_with("http://") || self.api_base.starts_with("https://")) {
            return Err(ConfigError::invalid_value(
                "api_base",
                "must be an http(s) URL",
            ));
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scan_interval)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }
}
