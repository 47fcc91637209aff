//! Client configuration file support.
//!
//! Configuration is read from TOML. Every field has a default, so an empty
//! file (or no file at all) yields a client for the public countries API.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::batch::{BatchConfig, BatchConfigError};
use crate::cache::{CacheConfig, CacheConfigError};
use crate::transport::DEFAULT_ENDPOINT;

/// Client configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ClientConfig {
    /// GraphQL endpoint URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// HTTP timeout in seconds; `None` leaves calls unbounded.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    /// Headers sent with every request.
    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Batch scheduler settings.
    #[serde(default)]
    pub batch: BatchConfig,

    /// Response cache settings.
    #[serde(default)]
    pub cache: CacheConfig,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout_secs: None,
            headers: HashMap::new(),
            batch: BatchConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),

    /// Invalid batch settings.
    #[error(transparent)]
    Batch(#[from] BatchConfigError),

    /// Invalid cache settings.
    #[error(transparent)]
    Cache(#[from] CacheConfigError),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl ClientConfig {
    /// Validate the whole configuration.
    ///
    /// # Errors
    /// Returns `ConfigError` for an empty endpoint, a zero timeout or invalid
    /// batch or cache settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue("endpoint must not be empty".to_string()));
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue("timeout_secs must be greater than 0".to_string()));
        }
        self.batch.validate()?;
        self.cache.validate()?;
        Ok(())
    }

    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".terra")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".terrarc")
    }

    /// Discover and load configuration files.
    ///
    /// Loads configuration from:
    /// 1. Global config (~/.terra/config.toml)
    /// 2. Local config (./.terrarc)
    ///
    /// Local config replaces global config wholesale; missing or unreadable
    /// files fall back to defaults.
    pub fn discover_and_load() -> Self {
        Self::load_first([Self::default_local_path(), Self::default_global_path()])
    }

    fn load_first(paths: impl IntoIterator<Item = PathBuf>) -> Self {
        paths
            .into_iter()
            .find_map(|path| match Self::load_from_file(&path) {
                Ok(config) => Some(config),
                Err(ConfigError::NotFound(_)) => None,
                Err(e) => {
                    tracing::warn!(error = %e, "Ignoring invalid configuration file");
                    None
                }
            })
            .unwrap_or_default()
    }
}
