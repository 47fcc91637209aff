//! Reusable query and mutation handles.
//!
//! These wrap the batch and single-request clients with an error policy and
//! a rate-limit latch, so UI-like callers can re-run an operation without
//! re-deciding how its failures are surfaced.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use terra_abstraction::{GraphqlError, Variables};
use tracing::{debug, error, warn};

use crate::batch::{BatchClient, QueueName};
use crate::cache::CacheDirective;
use crate::single::{RequestOptions, SingleRequestClient};

/// How a failed operation is reported in its outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorPolicy {
    /// Surface the error in `QueryOutcome::error`.
    #[default]
    All,
    /// Swallow the error; the outcome carries neither data nor error.
    None,
}

/// Result of executing a query handle.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryOutcome<T> {
    pub data: Option<T>,
    pub error: Option<GraphqlError>,
    /// The operation was not sent (skipped or rate limited).
    pub skipped: bool,
}

impl<T> QueryOutcome<T> {
    fn skipped() -> Self {
        Self { data: None, error: None, skipped: true }
    }

    fn from_result(result: Result<T, GraphqlError>, policy: ErrorPolicy) -> Self {
        match result {
            Ok(data) => Self { data: Some(data), error: None, skipped: false },
            Err(e) => Self {
                data: None,
                error: (policy == ErrorPolicy::All).then_some(e),
                skipped: false,
            },
        }
    }
}

/// Latch that stops further requests once the server starts throttling.
///
/// Set by any rate-limited failure, cleared by any success. Clones share the
/// same latch.
#[derive(Debug, Clone, Default)]
pub struct RateLimitGate {
    latched: Arc<AtomicBool>,
}

impl RateLimitGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the gate from an error observed before this client started,
    /// for example during server-side rendering.
    #[must_use]
    pub fn with_initial_error(initial: Option<&GraphqlError>) -> Self {
        let gate = Self::new();
        if let Some(e) = initial {
            if e.is_rate_limited() {
                error!(error = %e, "Initial rate limit detected; skipping requests");
                gate.latched.store(true, Ordering::SeqCst);
            }
        }
        gate
    }

    #[must_use]
    pub fn is_latched(&self) -> bool {
        self.latched.load(Ordering::SeqCst)
    }

    /// Updates the latch from an operation result.
    pub fn observe<T>(&self, result: &Result<T, GraphqlError>) {
        match result {
            Ok(_) => self.latched.store(false, Ordering::SeqCst),
            Err(e) if e.is_rate_limited() => {
                warn!(error = %e, "Rate limited; further requests are skipped");
                self.latched.store(true, Ordering::SeqCst);
            }
            Err(_) => {}
        }
    }

    /// Clears the latch.
    pub fn reset(&self) {
        self.latched.store(false, Ordering::SeqCst);
    }
}

/// A query bound to a batch queue.
#[derive(Debug, Clone)]
pub struct BatchedQuery<T> {
    client: BatchClient,
    query: String,
    variables: Option<Variables>,
    queue: QueueName,
    skip: bool,
    policy: ErrorPolicy,
    gate: RateLimitGate,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> BatchedQuery<T> {
    /// Creates a query on the general queue with the `All` error policy.
    pub fn new(client: BatchClient, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
            variables: None,
            queue: QueueName::General,
            skip: false,
            policy: ErrorPolicy::All,
            gate: RateLimitGate::new(),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }

    #[must_use]
    pub const fn with_queue(mut self, queue: QueueName) -> Self {
        self.queue = queue;
        self
    }

    #[must_use]
    pub const fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    #[must_use]
    pub const fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Shares `gate` with this query.
    #[must_use]
    pub fn with_gate(mut self, gate: RateLimitGate) -> Self {
        self.gate = gate;
        self
    }

    pub const fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    /// Runs the query through its batch queue. Calling it again refetches.
    pub async fn execute(&self) -> QueryOutcome<T> {
        if self.skip || self.gate.is_latched() {
            debug!(queue = %self.queue, skip = self.skip, "Skipping batched query");
            return QueryOutcome::skipped();
        }

        let result = self
            .client
            .request::<T>(self.queue, self.query.clone(), self.variables.clone())
            .await;
        if let Err(e) = &result {
            error!(error = %e, queue = %self.queue, "GraphQL query failed");
        }
        self.gate.observe(&result);
        QueryOutcome::from_result(result, self.policy)
    }
}

/// Per-call overrides of a lazy query or mutation.
#[derive(Debug, Clone, Default)]
pub struct ExecuteOptions {
    pub variables: Option<Variables>,
    pub error_policy: Option<ErrorPolicy>,
    pub cache: Option<CacheDirective>,
}

impl ExecuteOptions {
    #[must_use]
    pub fn with_variables(variables: Variables) -> Self {
        Self { variables: Some(variables), ..Self::default() }
    }
}

/// A query that runs on demand through the single-request path.
#[derive(Debug, Clone)]
pub struct LazyQuery<T> {
    client: SingleRequestClient,
    query: String,
    policy: ErrorPolicy,
    cache: Option<CacheDirective>,
    gate: RateLimitGate,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> LazyQuery<T> {
    pub fn new(client: SingleRequestClient, query: impl Into<String>) -> Self {
        Self {
            client,
            query: query.into(),
            policy: ErrorPolicy::All,
            cache: None,
            gate: RateLimitGate::new(),
            _marker: PhantomData,
        }
    }

    /// Default cache directive for every execution.
    #[must_use]
    pub fn with_cache(mut self, directive: CacheDirective) -> Self {
        self.cache = Some(directive);
        self
    }

    #[must_use]
    pub const fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub const fn gate(&self) -> &RateLimitGate {
        &self.gate
    }

    /// Executes the query, applying `options` over the defaults.
    pub async fn execute(&self, options: ExecuteOptions) -> QueryOutcome<T> {
        if self.gate.is_latched() {
            debug!("Skipping lazy query while rate limited");
            return QueryOutcome::skipped();
        }

        let policy = options.error_policy.unwrap_or(self.policy);
        let request_options = RequestOptions {
            cache: options.cache.or_else(|| self.cache.clone()),
            silent: false,
        };

        let result = self.client.request::<T>(&self.query, options.variables, &request_options).await;
        self.gate.observe(&result);
        QueryOutcome::from_result(result, policy)
    }
}

/// A mutation sent through the single-request path.
///
/// With the `None` error policy failures are also kept out of the log.
#[derive(Debug, Clone)]
pub struct Mutation<T> {
    client: SingleRequestClient,
    mutation: String,
    policy: ErrorPolicy,
    cache: Option<CacheDirective>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Mutation<T> {
    pub fn new(client: SingleRequestClient, mutation: impl Into<String>) -> Self {
        Self {
            client,
            mutation: mutation.into(),
            policy: ErrorPolicy::All,
            cache: None,
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub const fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_cache(mut self, directive: CacheDirective) -> Self {
        self.cache = Some(directive);
        self
    }

    pub async fn execute(&self, options: ExecuteOptions) -> QueryOutcome<T> {
        let policy = options.error_policy.unwrap_or(self.policy);
        let request_options = RequestOptions {
            cache: options.cache.or_else(|| self.cache.clone()),
            silent: policy == ErrorPolicy::None,
        };

        let tracked = tracked_view(options.variables.as_ref());
        let result =
            self.client.request::<T>(&self.mutation, options.variables, &request_options).await;
        if result.is_err() && policy == ErrorPolicy::None {
            match tracked {
                Some((country_code, action)) => {
                    warn!(%country_code, %action, "Tracking country view");
                }
                None => debug!("Mutation failed; error suppressed by policy"),
            }
        }
        QueryOutcome::from_result(result, policy)
    }
}

/// The `countryCode` and `action` of a view-tracking mutation, when both are strings.
fn tracked_view(variables: Option<&Variables>) -> Option<(String, String)> {
    let variables = variables?;
    let country_code = variables.get("countryCode")?.as_str()?;
    let action = variables.get("action")?.as_str()?;
    Some((country_code.to_string(), action.to_string()))
}
