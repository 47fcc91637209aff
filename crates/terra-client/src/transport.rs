//! HTTP transport for the countries GraphQL API.
//!
//! This module provides an implementation of the `Transport` trait that issues
//! one JSON `POST` per operation using `reqwest`.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use terra_abstraction::{GraphqlError, GraphqlRequest, GraphqlResponse, Transport};
use tracing::{debug, error};

use crate::config::ClientConfig;

/// The public countries API used when no endpoint is configured.
pub const DEFAULT_ENDPOINT: &str = "https://countries.trevorblades.com/graphql";

/// `reqwest`-backed GraphQL transport.
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// The GraphQL endpoint (e.g., "https://countries.trevorblades.com/graphql").
    endpoint: String,
    /// HTTP client for making requests.
    client: Client,
}

impl HttpTransport {
    /// Creates a transport for the default countries endpoint.
    #[must_use]
    pub fn new() -> Self {
        Self::with_endpoint(DEFAULT_ENDPOINT.to_string())
    }

    /// Creates a transport for a custom endpoint.
    ///
    /// # Arguments
    /// * `endpoint` - Full URL of the GraphQL endpoint
    #[must_use]
    pub fn with_endpoint(endpoint: String) -> Self {
        Self { endpoint, client: Client::new() }
    }

    /// Creates a transport from client configuration.
    ///
    /// Applies the configured endpoint, default headers and HTTP timeout.
    ///
    /// # Errors
    /// Returns `GraphqlError::Config` if a header is invalid or the HTTP
    /// client cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, GraphqlError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| GraphqlError::Config(format!("Invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| GraphqlError::Config(format!("Invalid header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }

        let mut builder = Client::builder().default_headers(headers);
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| GraphqlError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { endpoint: config.endpoint.clone(), client })
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: &GraphqlRequest) -> Result<Value, GraphqlError> {
        debug!(
            endpoint = %self.endpoint,
            query_len = request.query.len(),
            has_variables = request.variables.is_some(),
            "HttpTransport sending GraphQL request"
        );

        // `json` sets `Content-Type: application/json`
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, endpoint = %self.endpoint, "Failed to reach GraphQL endpoint");
                GraphqlError::Network {
                    status: e.status().map(|s| s.as_u16()),
                    message: format!("Network error: {}", e),
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GraphqlError::Network {
                status: Some(status.as_u16()),
                message: format!("Failed to read response body: {}", e),
            }
        })?;

        if !status.is_success() {
            error!(status = %status, "GraphQL endpoint returned error status");

            // Servers often explain 4xx/5xx answers with a GraphQL error list
            let detail = serde_json::from_str::<GraphqlResponse>(&body)
                .ok()
                .and_then(|r| r.errors)
                .filter(|errors| !errors.is_empty())
                .map(|errors| {
                    errors.iter().map(|e| e.message.as_str()).collect::<Vec<_>>().join(", ")
                });

            let message = match detail {
                Some(detail) => format!("HTTP error! status: {} ({})", status.as_u16(), detail),
                None => format!("HTTP error! status: {}", status.as_u16()),
            };
            return Err(GraphqlError::http(status.as_u16(), message));
        }

        let parsed: GraphqlResponse = serde_json::from_str(&body).map_err(|e| {
            error!(error = %e, "Failed to parse GraphQL response");
            GraphqlError::Serialization(format!("Failed to parse response: {}", e))
        })?;

        parsed.into_result()
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use terra_abstraction::Variables;

    fn countries_request() -> GraphqlRequest {
        GraphqlRequest::new("query { countries { code } }")
    }

    #[test]
    fn test_http_transport_default_endpoint() {
        let transport = HttpTransport::new();
        assert_eq!(transport.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_from_config_rejects_invalid_header() {
        let mut config = ClientConfig::default();
        config.headers = HashMap::from([("bad header".to_string(), "x".to_string())]);

        let result = HttpTransport::from_config(&config);
        assert!(matches!(result, Err(GraphqlError::Config(_))));
    }

    #[tokio::test]
    async fn test_send_returns_data() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("content-type", "application/json")
            .match_body(mockito::Matcher::PartialJson(json!({
                "query": "query { countries { code } }"
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data": {"countries": [{"code": "NL"}]}}"#)
            .create_async()
            .await;

        let transport = HttpTransport::with_endpoint(format!("{}/graphql", server.url()));
        let data = transport.send(&countries_request()).await.unwrap();

        assert_eq!(data, json!({ "countries": [{ "code": "NL" }] }));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_posts_variables() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_body(mockito::Matcher::Json(json!({
                "query": "query Country($code: ID!) { country(code: $code) { name } }",
                "variables": { "code": "BE" }
            })))
            .with_status(200)
            .with_body(r#"{"data": {"country": {"name": "Belgium"}}}"#)
            .create_async()
            .await;

        let mut variables = Variables::new();
        variables.insert("code".to_string(), json!("BE"));
        let request =
            GraphqlRequest::new("query Country($code: ID!) { country(code: $code) { name } }")
                .with_variables(variables);

        let transport = HttpTransport::with_endpoint(format!("{}/graphql", server.url()));
        let data = transport.send(&request).await.unwrap();

        assert_eq!(data["country"]["name"], "Belgium");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_graphql_errors_are_joined() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"errors": [{"message": "Unknown field"}, {"message": "Bad argument"}]}"#)
            .create_async()
            .await;

        let transport = HttpTransport::with_endpoint(format!("{}/graphql", server.url()));
        let result = transport.send(&countries_request()).await;

        assert_eq!(
            result,
            Err(GraphqlError::Graphql("Unknown field, Bad argument".to_string()))
        );
    }

    #[tokio::test]
    async fn test_send_non_success_status() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(429)
            .with_body("Too Many Requests")
            .create_async()
            .await;

        let transport = HttpTransport::with_endpoint(format!("{}/graphql", server.url()));
        let error = transport.send(&countries_request()).await.unwrap_err();

        assert_eq!(error.status(), Some(429));
        assert!(error.is_rate_limited());
        assert!(error.to_string().contains("HTTP error! status: 429"));
    }

    #[tokio::test]
    async fn test_send_error_status_with_graphql_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(400)
            .with_body(r#"{"errors": [{"message": "Syntax Error"}]}"#)
            .create_async()
            .await;

        let transport = HttpTransport::with_endpoint(format!("{}/graphql", server.url()));
        let error = transport.send(&countries_request()).await.unwrap_err();

        assert_eq!(error.status(), Some(400));
        assert!(error.to_string().contains("Syntax Error"));
    }

    #[tokio::test]
    async fn test_send_invalid_json_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body("<html>not json</html>")
            .create_async()
            .await;

        let transport = HttpTransport::with_endpoint(format!("{}/graphql", server.url()));
        let result = transport.send(&countries_request()).await;

        assert!(matches!(result, Err(GraphqlError::Serialization(_))));
    }

    #[tokio::test]
    async fn test_send_unreachable_endpoint() {
        // Port 9 (discard) is not expected to host an HTTP server
        let transport = HttpTransport::with_endpoint("http://127.0.0.1:9/graphql".to_string());
        let error = transport.send(&countries_request()).await.unwrap_err();

        assert!(matches!(error, GraphqlError::Network { status: None, .. }));
    }

    #[tokio::test]
    async fn test_from_config_sends_default_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .match_header("x-client", "terra")
            .with_status(200)
            .with_body(r#"{"data": {}}"#)
            .create_async()
            .await;

        let mut config = ClientConfig::default();
        config.endpoint = format!("{}/graphql", server.url());
        config.headers = HashMap::from([("x-client".to_string(), "terra".to_string())]);

        let transport = HttpTransport::from_config(&config).unwrap();
        transport.send(&countries_request()).await.unwrap();

        mock.assert_async().await;
    }
}
