//! GraphQL transport abstraction for Terra.
//!
//! This module defines the wire types, the error taxonomy, and the `Transport`
//! trait shared by the batching and single-request clients.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// GraphQL variables: a JSON object keyed by variable name.
pub type Variables = serde_json::Map<String, Value>;

/// HTTP status used by servers to signal throttling.
pub const TOO_MANY_REQUESTS: u16 = 429;

/// Represents an error that can occur while executing a GraphQL operation.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GraphqlError {
    /// Transport-level failure: connection problems or a non-2xx HTTP status.
    #[error("Network Error: {message}")]
    Network {
        /// The HTTP status, when the server answered at all.
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
        /// Human-readable description.
        message: String,
    },

    /// The server answered 2xx but reported GraphQL `errors`.
    ///
    /// Holds every error message joined with `", "`.
    #[error("GraphQL Error: {0}")]
    Graphql(String),

    /// A request body, response body or result payload could not be (de)serialized.
    #[error("Serialization Error: {0}")]
    Serialization(String),

    /// The dispatcher collected a different number of outcomes than requests it sent.
    #[error("Invalid number of results received: expected {expected}, got {actual}")]
    SliceIntegrity {
        /// Number of requests in the slice.
        expected: usize,
        /// Number of outcomes collected.
        actual: usize,
    },

    /// The result channel was closed before the request settled.
    #[error("Request dropped before it settled")]
    Dropped,

    /// Invalid client configuration.
    #[error("Configuration Error: {0}")]
    Config(String),
}

impl GraphqlError {
    /// Builds a `Network` error from an HTTP status and message.
    #[must_use]
    pub fn http(status: u16, message: impl Into<String>) -> Self {
        Self::Network { status: Some(status), message: message.into() }
    }

    /// Builds a `Network` error for a failure that never produced a status.
    #[must_use]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Network { status: None, message: message.into() }
    }

    /// Returns the HTTP status carried by this error, if any.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Network { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns `true` when the failure indicates the API is throttling us.
    ///
    /// When the server answered, only a 429 status counts. Errors without a
    /// status (for example gateway messages relayed as GraphQL errors) are
    /// matched on their text.
    #[must_use]
    pub fn is_rate_limited(&self) -> bool {
        if let Some(status) = self.status() {
            return status == TOO_MANY_REQUESTS;
        }
        let message = self.to_string();
        message.contains("429") || message.contains("Too Many Requests")
    }
}

/// A single GraphQL operation as sent on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlRequest {
    /// The query or mutation document.
    pub query: String,
    /// Optional operation variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Variables>,
}

impl GraphqlRequest {
    /// Creates a request without variables.
    #[must_use]
    pub fn new(query: impl Into<String>) -> Self {
        Self { query: query.into(), variables: None }
    }

    /// Attaches variables to the request.
    #[must_use]
    pub fn with_variables(mut self, variables: Variables) -> Self {
        self.variables = Some(variables);
        self
    }
}

/// Source position reported alongside a GraphQL error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorLocation {
    /// 1-based line in the query document.
    pub line: u32,
    /// 1-based column in the query document.
    pub column: u32,
}

/// One segment of a GraphQL error path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// Field name.
    Field(String),
    /// List index.
    Index(u64),
}

/// An entry of the `errors` array of a GraphQL response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlErrorEntry {
    /// Human-readable message.
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Vec<ErrorLocation>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Vec<PathSegment>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Map<String, Value>>,
}

/// The body of a GraphQL HTTP response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlResponse<T = Value> {
    /// Operation result.
    #[serde(default)]
    pub data: Option<T>,
    /// Errors reported by the server.
    #[serde(default)]
    pub errors: Option<Vec<GraphqlErrorEntry>>,
}

impl GraphqlResponse<Value> {
    /// Converts the response into the operation's data.
    ///
    /// Any non-empty `errors` array wins over `data`; a response carrying
    /// neither yields `Value::Null`.
    ///
    /// # Errors
    /// Returns `GraphqlError::Graphql` with the joined error messages.
    pub fn into_result(self) -> Result<Value, GraphqlError> {
        match self.errors {
            Some(errors) if !errors.is_empty() => Err(GraphqlError::Graphql(
                errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join(", "),
            )),
            _ => Ok(self.data.unwrap_or(Value::Null)),
        }
    }
}

/// A trait for issuing one GraphQL operation against an endpoint.
///
/// Implementations perform exactly one network call per `send`, with no
/// retries and no caching. They must be `Send + Sync` so a single instance can
/// serve every queue of a batch client.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Sends the request and returns the `data` member of the response.
    ///
    /// # Errors
    /// Returns a `GraphqlError` for network, HTTP status, GraphQL-level or
    /// decoding failures.
    async fn send(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError>;

    /// Returns the endpoint this transport talks to.
    fn endpoint(&self) -> &str;
}
