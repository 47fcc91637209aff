//! Single, unbatched GraphQL requests.
//!
//! Use this path for slow queries, mutations, and anything that needs cache
//! directives. Requests carrying a `CacheDirective` go through the caching
//! fetch surface; all others go straight to the transport.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use terra_abstraction::{GraphqlError, GraphqlRequest, Transport, Variables};
use tracing::error;

use crate::cache::{CacheDirective, CachedTransport, CachingFetch, ResponseCache};

/// Per-request options of the single-request path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Cache hints; `None` sends the request uncached.
    #[serde(default)]
    pub cache: Option<CacheDirective>,
    /// Suppress the failure diagnostic. The error is still returned.
    #[serde(default)]
    pub silent: bool,
}

impl RequestOptions {
    /// Options carrying a cache directive.
    #[must_use]
    pub const fn cached(directive: CacheDirective) -> Self {
        Self { cache: Some(directive), silent: false }
    }

    /// Sets the silent flag.
    #[must_use]
    pub const fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }
}

/// Client for single requests with optional caching.
#[derive(Clone)]
pub struct SingleRequestClient {
    transport: Arc<dyn Transport>,
    fetch: Arc<dyn CachingFetch>,
}

impl SingleRequestClient {
    /// Creates a client from a transport and a caching fetch surface.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, fetch: Arc<dyn CachingFetch>) -> Self {
        Self { transport, fetch }
    }

    /// Creates a client whose cached requests are served from `cache`.
    #[must_use]
    pub fn with_cache(transport: Arc<dyn Transport>, cache: ResponseCache) -> Self {
        let fetch = Arc::new(CachedTransport::new(Arc::clone(&transport), cache));
        Self { transport, fetch }
    }

    /// Sends one operation, honouring the cache directive in `options`.
    ///
    /// # Errors
    /// Returns the transport or cache layer failure unchanged. Unless
    /// `options.silent` is set, the failure is also logged.
    pub async fn send_cacheable(
        &self,
        query: &str,
        variables: Option<Variables>,
        options: &RequestOptions,
    ) -> Result<Value, GraphqlError> {
        let request = GraphqlRequest { query: query.to_string(), variables };

        let result = match &options.cache {
            Some(directive) => self.fetch.fetch(&request, directive).await,
            None => self.transport.send(&request).await,
        };

        if let Err(e) = &result {
            if !options.silent {
                error!(error = %e, endpoint = %self.transport.endpoint(), "GraphQL request failed");
            }
        }

        result
    }

    /// Sends one operation and deserializes its data into `T`.
    ///
    /// # Errors
    /// Same as `send_cacheable`, plus `GraphqlError::Serialization` when the
    /// data does not match `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Option<Variables>,
        options: &RequestOptions,
    ) -> Result<T, GraphqlError> {
        let data = self.send_cacheable(query, variables, options).await?;
        serde_json::from_value(data)
            .map_err(|e| GraphqlError::Serialization(format!("Failed to decode data: {}", e)))
    }
}

impl fmt::Debug for SingleRequestClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SingleRequestClient")
            .field("endpoint", &self.transport.endpoint())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::{HttpTransport, MockTransport};
    use serde_json::json;

    fn client(transport: &Arc<MockTransport>) -> (SingleRequestClient, ResponseCache) {
        let cache = ResponseCache::new(CacheConfig::default()).unwrap();
        (SingleRequestClient::with_cache(transport.clone(), cache.clone()), cache)
    }

    #[tokio::test]
    async fn test_uncached_request_goes_to_transport() {
        let transport = Arc::new(MockTransport::new());
        let (client, cache) = client(&transport);

        client.send_cacheable("q", None, &RequestOptions::default()).await.unwrap();
        client.send_cacheable("q", None, &RequestOptions::default()).await.unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(cache.get_stats().total_misses, 0);
    }

    #[tokio::test]
    async fn test_cached_request_uses_cache() {
        let transport = Arc::new(MockTransport::new());
        let (client, cache) = client(&transport);
        let options = RequestOptions::cached(CacheDirective::after(3600).with_tag("countries"));

        client.send_cacheable("q", None, &options).await.unwrap();
        client.send_cacheable("q", None, &options).await.unwrap();

        assert_eq!(transport.call_count(), 1);
        assert_eq!(cache.get_stats().total_hits, 1);
    }

    #[tokio::test]
    async fn test_silent_failure_still_propagates() {
        let transport = Arc::new(
            MockTransport::new().with_failure("track", GraphqlError::http(500, "boom")),
        );
        let (client, _cache) = client(&transport);

        let options = RequestOptions::default().with_silent(true);
        let result = client.send_cacheable("track", None, &options).await;

        assert_eq!(result, Err(GraphqlError::http(500, "boom")));
    }

    #[tokio::test]
    async fn test_request_deserializes() {
        let transport = Arc::new(MockTransport::new());
        let (client, _cache) = client(&transport);

        let mut variables = Variables::new();
        variables.insert("code".to_string(), json!("NL"));
        let echoed: Value = client
            .request("query Country", Some(variables), &RequestOptions::default())
            .await
            .unwrap();

        assert_eq!(echoed["variables"]["code"], "NL");
    }

    #[tokio::test]
    async fn test_cached_request_over_http() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/graphql")
            .with_status(200)
            .with_body(r#"{"data": {"country": {"name": "Netherlands"}}}"#)
            .expect(1)
            .create_async()
            .await;

        let transport: Arc<dyn Transport> =
            Arc::new(HttpTransport::with_endpoint(format!("{}/graphql", server.url())));
        let cache = ResponseCache::new(CacheConfig::default()).unwrap();
        let client = SingleRequestClient::with_cache(transport, cache);

        let options = RequestOptions::cached(CacheDirective::after(3600).with_tag("country-details-NL"));
        let query = "{ country(code: \"NL\") { name } }";
        let first = client.send_cacheable(query, None, &options).await.unwrap();
        let second = client.send_cacheable(query, None, &options).await.unwrap();

        assert_eq!(first["country"]["name"], "Netherlands");
        assert_eq!(first, second);
        mock.assert_async().await;
    }
}
