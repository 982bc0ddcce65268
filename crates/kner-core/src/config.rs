//! KNER Configuration Management
//!
//! Handles configuration from environment variables and TOML files
//! with sensible defaults for local development.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// NER service connection
    pub api: ApiConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("NER_API_URL") {
            config.api.base_url = url;
        }
        if let Ok(prefix) = std::env::var("NER_API_PREFIX") {
            config.api.prefix = prefix;
        }
        if let Ok(limit) = std::env::var("NER_HISTORY_LIMIT") {
            config.api.history_page_size =
                limit.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "NER_HISTORY_LIMIT".to_string(),
                    value: limit,
                })?;
        }

        // Logging
        if let Ok(level) = std::env::var("LOG_LEVEL") {
            config.logging.level = level;
        }
        if let Ok(json) = std::env::var("LOG_JSON") {
            config.logging.json_format = matches!(json.as_str(), "1" | "true" | "yes");
        }

        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::FileReadError {
            path: path.clone(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path,
            message: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Merge with environment variables (env takes precedence)
    pub fn with_env_override(mut self) -> Result<Self, ConfigError> {
        let env_config = Self::from_env()?;
        let defaults = Self::default();

        // Only override if env values differ from defaults
        if env_config.api.base_url != defaults.api.base_url {
            self.api.base_url = env_config.api.base_url;
        }
        if env_config.api.prefix != defaults.api.prefix {
            self.api.prefix = env_config.api.prefix;
        }
        if env_config.api.history_page_size != defaults.api.history_page_size {
            self.api.history_page_size = env_config.api.history_page_size;
        }
        if env_config.logging.level != defaults.logging.level {
            self.logging.level = env_config.logging.level;
        }
        if env_config.logging.json_format {
            self.logging.json_format = true;
        }

        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::MissingRequired("api.base_url".to_string()));
        }
        if self.api.history_page_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.history_page_size".to_string(),
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}

/// NER service connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Service origin, e.g. `http://localhost:8000`
    pub base_url: String,

    /// Path prefix shared by every endpoint
    pub prefix: String,

    /// Number of history records requested per page
    pub history_page_size: u32,
}

impl ApiConfig {
    /// Full URL of an endpoint under the API prefix
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        let prefix = self.prefix.trim_matches('/');
        let path = path.trim_start_matches('/');

        if prefix.is_empty() {
            format!("{base}/{path}")
        } else {
            format!("{base}/{prefix}/{path}")
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            prefix: "/api/v1".to_string(),
            history_page_size: 50,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// JSON format for logs
    pub json_format: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Missing required configuration: {0}")]
    MissingRequired(String),
}

impl From<ConfigError> for crate::KnerError {
    fn from(err: ConfigError) -> Self {
        crate::KnerError::Config(err.to_string())
    }
}
