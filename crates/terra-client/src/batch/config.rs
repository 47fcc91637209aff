//! Configuration for request batching.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use super::queue::QueueName;

/// Maximum number of requests drained from a queue per flush.
pub const MAX_BATCH_SIZE: usize = 10;

/// Flush delay of the critical queue in milliseconds.
pub const CRITICAL_BATCH_DELAY_MS: u64 = 10;

/// Flush delay of the general queue in milliseconds.
pub const GENERAL_BATCH_DELAY_MS: u64 = 50;

/// Configuration for the batch scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchConfig {
    /// Maximum number of requests dispatched per slice (default: 10).
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Milliseconds the critical queue waits before flushing (default: 10).
    #[serde(default = "default_critical_delay_ms")]
    pub critical_delay_ms: u64,

    /// Milliseconds the general queue waits before flushing (default: 50).
    #[serde(default = "default_general_delay_ms")]
    pub general_delay_ms: u64,
}

fn default_max_batch_size() -> usize {
    MAX_BATCH_SIZE
}

fn default_critical_delay_ms() -> u64 {
    CRITICAL_BATCH_DELAY_MS
}

fn default_general_delay_ms() -> u64 {
    GENERAL_BATCH_DELAY_MS
}

/// Errors that can occur during batch configuration validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BatchConfigError {
    /// Invalid max batch size (must be > 0).
    #[error("Invalid max batch size: must be greater than 0")]
    InvalidMaxBatchSize,

    /// The critical queue must not wait longer than the general queue.
    #[error("Invalid delays: critical delay ({critical}ms) exceeds general delay ({general}ms)")]
    CriticalSlowerThanGeneral {
        /// Configured critical delay.
        critical: u64,
        /// Configured general delay.
        general: u64,
    },
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            max_batch_size: default_max_batch_size(),
            critical_delay_ms: default_critical_delay_ms(),
            general_delay_ms: default_general_delay_ms(),
        }
    }
}

impl BatchConfig {
    /// Validate the batch configuration.
    ///
    /// # Errors
    /// Returns `BatchConfigError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), BatchConfigError> {
        if self.max_batch_size == 0 {
            return Err(BatchConfigError::InvalidMaxBatchSize);
        }

        if self.critical_delay_ms > self.general_delay_ms {
            return Err(BatchConfigError::CriticalSlowerThanGeneral {
                critical: self.critical_delay_ms,
                general: self.general_delay_ms,
            });
        }

        Ok(())
    }

    /// Get the flush delay of a queue as a Duration.
    #[must_use]
    pub fn delay_for(&self, queue: QueueName) -> Duration {
        match queue {
            QueueName::Critical => Duration::from_millis(self.critical_delay_ms),
            QueueName::General => Duration::from_millis(self.general_delay_ms),
        }
    }
}
