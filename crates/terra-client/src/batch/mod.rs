//! Time-windowed request batching.
//!
//! Callers enqueue GraphQL operations on one of two queues. Each queue
//! collects requests for a short window, then dispatches up to
//! `max_batch_size` of them concurrently and routes every outcome back to its
//! own caller.
//!
//! ```no_run
//! use std::sync::Arc;
//! use terra_client::{BatchClient, HttpTransport, QueueName};
//!
//! # async fn example() -> Result<(), terra_abstraction::GraphqlError> {
//! let client = BatchClient::with_defaults(Arc::new(HttpTransport::new()));
//!
//! let countries = client.enqueue(QueueName::Critical, "{ countries { code } }", None);
//! let continents = client.enqueue(QueueName::Critical, "{ continents { code } }", None);
//! let (countries, continents) = tokio::join!(countries, continents);
//! println!("{:?} {:?}", countries?, continents?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod queue;
pub mod scheduler;

use serde::de::DeserializeOwned;
use std::sync::Arc;
use terra_abstraction::{GraphqlError, GraphqlRequest, Transport, Variables};

pub use config::{BatchConfig, BatchConfigError};
pub use dispatcher::Dispatcher;
pub use queue::{PendingRequest, QueueName, ResponseFuture};
pub use scheduler::{BatchStats, Scheduler, SchedulerState};

impl From<BatchConfigError> for GraphqlError {
    fn from(error: BatchConfigError) -> Self {
        Self::Config(error.to_string())
    }
}

/// Entry point for batched GraphQL requests.
///
/// Owns one scheduler per queue name. Cloning yields another handle to the
/// same queues; independent clients (for example in tests) do not share state.
#[derive(Debug, Clone)]
pub struct BatchClient {
    critical: Arc<Scheduler>,
    general: Arc<Scheduler>,
    config: BatchConfig,
}

impl BatchClient {
    /// Creates a batch client with the given configuration.
    ///
    /// # Errors
    /// Returns `BatchConfigError` if the configuration is invalid.
    pub fn new(transport: Arc<dyn Transport>, config: BatchConfig) -> Result<Self, BatchConfigError> {
        config.validate()?;
        Ok(Self::build(transport, config))
    }

    /// Creates a batch client with the default batch size and delays.
    #[must_use]
    pub fn with_defaults(transport: Arc<dyn Transport>) -> Self {
        Self::build(transport, BatchConfig::default())
    }

    fn build(transport: Arc<dyn Transport>, config: BatchConfig) -> Self {
        let dispatcher = Dispatcher::new(transport);
        let scheduler = |name: QueueName| {
            Arc::new(Scheduler::new(
                name,
                config.delay_for(name),
                config.max_batch_size,
                dispatcher.clone(),
            ))
        };

        Self {
            critical: scheduler(QueueName::Critical),
            general: scheduler(QueueName::General),
            config,
        }
    }

    fn scheduler(&self, queue: QueueName) -> &Arc<Scheduler> {
        match queue {
            QueueName::Critical => &self.critical,
            QueueName::General => &self.general,
        }
    }

    /// Queues an operation and returns a future for its outcome.
    ///
    /// Enqueueing never waits; the request is sent when its queue flushes,
    /// whether or not the returned future is polled. Identical operations are
    /// not deduplicated.
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime, because the flush timer
    /// is spawned onto it.
    pub fn enqueue(
        &self,
        queue: QueueName,
        query: impl Into<String>,
        variables: Option<Variables>,
    ) -> ResponseFuture {
        let request = GraphqlRequest { query: query.into(), variables };
        let (pending, future) = PendingRequest::new(request);
        self.scheduler(queue).enqueue(pending);
        future
    }

    /// Queues an operation and deserializes its data into `T`.
    ///
    /// # Errors
    /// Returns the request's own failure, or `GraphqlError::Serialization`
    /// when the data does not match `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        queue: QueueName,
        query: impl Into<String>,
        variables: Option<Variables>,
    ) -> Result<T, GraphqlError> {
        let data = self.enqueue(queue, query, variables).await?;
        serde_json::from_value(data)
            .map_err(|e| GraphqlError::Serialization(format!("Failed to decode data: {}", e)))
    }

    /// Current scheduling state of a queue.
    #[must_use]
    pub fn state(&self, queue: QueueName) -> SchedulerState {
        self.scheduler(queue).state()
    }

    /// Counters of a queue.
    #[must_use]
    pub fn stats(&self, queue: QueueName) -> BatchStats {
        self.scheduler(queue).stats()
    }

    /// The batch configuration.
    #[must_use]
    pub const fn config(&self) -> &BatchConfig {
        &self.config
    }
}
