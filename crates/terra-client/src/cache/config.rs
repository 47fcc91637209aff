//! Configuration for response caching.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the response cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Whether response caching is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Maximum number of responses to keep in memory (default: 256).
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_enabled() -> bool {
    true
}

fn default_max_entries() -> usize {
    256
}

/// Errors that can occur during cache configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheConfigError {
    /// Invalid max entries (must be > 0).
    #[error("Invalid max cache entries: must be greater than 0")]
    InvalidMaxEntries,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self { enabled: default_enabled(), max_entries: default_max_entries() }
    }
}

impl CacheConfig {
    /// Validate the cache configuration.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), CacheConfigError> {
        if self.max_entries == 0 {
            return Err(CacheConfigError::InvalidMaxEntries);
        }

        Ok(())
    }
}
