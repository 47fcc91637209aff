//! GraphQL clients for Terra.
//!
//! This crate provides the concrete `Transport` implementation and the two
//! request paths built on top of it.
//!
//! # Request paths
//!
//! - **Batched**: `BatchClient` coalesces operations on a `critical` or
//!   `general` queue and dispatches them in bounded, concurrent slices
//! - **Single**: `SingleRequestClient` sends one operation, optionally
//!   through the response cache
//! - **Helpers**: `BatchedQuery`, `LazyQuery` and `Mutation` add error
//!   policies and rate-limit handling on top of both paths

pub mod batch;
pub mod cache;
pub mod config;
pub mod countries;
pub mod query;
pub mod single;
pub mod transport;

use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use terra_abstraction::{GraphqlError, GraphqlRequest, Transport};
use tracing::debug;

pub use batch::{BatchClient, BatchConfig, BatchStats, QueueName, ResponseFuture, SchedulerState};
pub use cache::{
    CacheConfig, CacheDirective, CacheStats, CachedTransport, CachingFetch, ResponseCache,
    Revalidate,
};
pub use config::{ClientConfig, ConfigError};
pub use query::{BatchedQuery, ErrorPolicy, ExecuteOptions, LazyQuery, Mutation, QueryOutcome, RateLimitGate};
pub use single::{RequestOptions, SingleRequestClient};
pub use transport::{DEFAULT_ENDPOINT, HttpTransport};

/// A mock implementation of the `Transport` trait for testing and demonstration.
///
/// Every call is recorded. By default the request is echoed back as
/// `{"query": ..., "variables": ...}`; queries registered with
/// `with_failure` fail with the given error instead, and queries registered
/// with `with_hang` never complete.
#[derive(Debug, Default)]
pub struct MockTransport {
    calls: Mutex<Vec<GraphqlRequest>>,
    failures: HashMap<String, GraphqlError>,
    latency: Option<Duration>,
    query_latency: HashMap<String, Duration>,
    hanging: HashSet<String>,
}

impl MockTransport {
    /// Creates a new `MockTransport` that succeeds for every query.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes calls with exactly this query fail with `error`.
    #[must_use]
    pub fn with_failure(mut self, query: impl Into<String>, error: GraphqlError) -> Self {
        self.failures.insert(query.into(), error);
        self
    }

    /// Delays every response by `latency`.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Delays responses to this exact query by `latency`, overriding `with_latency`.
    #[must_use]
    pub fn with_query_latency(mut self, query: impl Into<String>, latency: Duration) -> Self {
        self.query_latency.insert(query.into(), latency);
        self
    }

    /// Makes calls with exactly this query never complete.
    #[must_use]
    pub fn with_hang(mut self, query: impl Into<String>) -> Self {
        self.hanging.insert(query.into());
        self
    }

    /// Every request received so far, in call order.
    pub fn calls(&self) -> Vec<GraphqlRequest> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// The query text of every request received so far, in call order.
    pub fn queries(&self) -> Vec<String> {
        self.calls().into_iter().map(|request| request.query).collect()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        debug!(query = %request.query, "MockTransport handling request");
        self.calls.lock().unwrap_or_else(PoisonError::into_inner).push(request.clone());

        if self.hanging.contains(&request.query) {
            std::future::pending::<()>().await;
        }

        if let Some(latency) = self.query_latency.get(&request.query).copied().or(self.latency) {
            tokio::time::sleep(latency).await;
        }

        if let Some(error) = self.failures.get(&request.query) {
            return Err(error.clone());
        }

        Ok(json!({
            "query": request.query,
            "variables": request.variables.clone().map_or(Value::Null, Value::Object),
        }))
    }

    fn endpoint(&self) -> &str {
        "mock://graphql"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_transport_echoes_request() {
        let transport = MockTransport::new();
        let request = GraphqlRequest::new("{ countries { code } }");

        let data = transport.send(&request).await.unwrap();

        assert_eq!(data["query"], "{ countries { code } }");
        assert_eq!(data["variables"], Value::Null);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(transport.endpoint(), "mock://graphql");
    }

    #[tokio::test]
    async fn test_mock_transport_failure() {
        let transport = MockTransport::new().with_failure("bad", GraphqlError::Graphql("nope".to_string()));

        let result = transport.send(&GraphqlRequest::new("bad")).await;

        assert_eq!(result, Err(GraphqlError::Graphql("nope".to_string())));
        assert_eq!(transport.queries(), vec!["bad"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_mock_transport_per_query_latency_and_hang() {
        let transport = MockTransport::new()
            .with_latency(Duration::from_millis(10))
            .with_query_latency("slow", Duration::from_secs(1))
            .with_hang("stuck");

        let started = tokio::time::Instant::now();
        transport.send(&GraphqlRequest::new("normal")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(10));
        assert!(started.elapsed() < Duration::from_secs(1));

        transport.send(&GraphqlRequest::new("slow")).await.unwrap();
        assert!(started.elapsed() >= Duration::from_millis(1010));

        let stuck = GraphqlRequest::new("stuck");
        let result = tokio::time::timeout(Duration::from_secs(5), transport.send(&stuck)).await;
        assert!(result.is_err());
        assert_eq!(transport.call_count(), 3);
    }
}
