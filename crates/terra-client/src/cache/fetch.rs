//! Fetch-with-cache-control surface.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use terra_abstraction::{GraphqlError, GraphqlRequest, Transport};
use tracing::debug;

use super::cache::ResponseCache;
use super::types::{CacheDirective, CacheKey, Revalidate};

/// A fetch layer that honours cache directives.
#[async_trait]
pub trait CachingFetch: Send + Sync {
    /// Fetches the request, serving or storing responses as the directive allows.
    ///
    /// # Errors
    /// Returns the transport's failure. Failures are never cached.
    async fn fetch(
        &self,
        request: &GraphqlRequest,
        directive: &CacheDirective,
    ) -> Result<Value, GraphqlError>;
}

/// A transport fronted by a `ResponseCache`.
#[derive(Clone)]
pub struct CachedTransport {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
}

impl CachedTransport {
    /// Wraps `transport` with `cache`.
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, cache: ResponseCache) -> Self {
        Self { transport, cache }
    }

    /// The cache, for revalidating tags or reading statistics.
    #[must_use]
    pub const fn cache(&self) -> &ResponseCache {
        &self.cache
    }
}

impl fmt::Debug for CachedTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CachedTransport")
            .field("endpoint", &self.transport.endpoint())
            .field("cache", &self.cache)
            .finish()
    }
}

#[async_trait]
impl CachingFetch for CachedTransport {
    async fn fetch(
        &self,
        request: &GraphqlRequest,
        directive: &CacheDirective,
    ) -> Result<Value, GraphqlError> {
        let ttl = match directive.revalidate {
            Revalidate::Never => return self.transport.send(request).await,
            Revalidate::After(secs) => Duration::from_secs(secs),
        };

        let key = CacheKey::for_request(request);
        if let Some(data) = self.cache.get(&key) {
            debug!(key = %key.as_str(), "Serving GraphQL response from cache");
            return Ok(data);
        }

        let data = self.transport.send(request).await?;
        self.cache.insert(key, data.clone(), ttl, directive.tags.clone());
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::MockTransport;

    fn cached(transport: &Arc<MockTransport>) -> CachedTransport {
        CachedTransport::new(transport.clone(), ResponseCache::new(CacheConfig::default()).unwrap())
    }

    #[tokio::test]
    async fn test_fetch_serves_second_call_from_cache() {
        let transport = Arc::new(MockTransport::new());
        let fetch = cached(&transport);
        let request = GraphqlRequest::new("{ countries { code } }");
        let directive = CacheDirective::after(3600);

        let first = fetch.fetch(&request, &directive).await.unwrap();
        let second = fetch.fetch(&request, &directive).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(transport.call_count(), 1);
        assert_eq!(fetch.cache().get_stats().total_hits, 1);
    }

    #[tokio::test]
    async fn test_fetch_never_bypasses_cache() {
        let transport = Arc::new(MockTransport::new());
        let fetch = cached(&transport);
        let request = GraphqlRequest::new("{ countries { code } }");

        fetch.fetch(&request, &CacheDirective::never()).await.unwrap();
        fetch.fetch(&request, &CacheDirective::never()).await.unwrap();

        assert_eq!(transport.call_count(), 2);
        assert_eq!(fetch.cache().get_stats().cache_size, 0);
    }

    #[tokio::test]
    async fn test_fetch_does_not_cache_failures() {
        let transport = Arc::new(
            MockTransport::new().with_failure("broken", GraphqlError::http(503, "unavailable")),
        );
        let fetch = cached(&transport);
        let request = GraphqlRequest::new("broken");
        let directive = CacheDirective::after(60);

        assert!(fetch.fetch(&request, &directive).await.is_err());
        assert!(fetch.fetch(&request, &directive).await.is_err());

        assert_eq!(transport.call_count(), 2);
        assert_eq!(fetch.cache().get_stats().cache_size, 0);
    }

    #[tokio::test]
    async fn test_revalidated_tag_is_fetched_again() {
        let transport = Arc::new(MockTransport::new());
        let fetch = cached(&transport);
        let request = GraphqlRequest::new("{ country(code: \"NL\") { name } }");
        let directive = CacheDirective::after(3600).with_tag("country-details-NL");

        fetch.fetch(&request, &directive).await.unwrap();
        assert_eq!(fetch.cache().revalidate_tag("country-details-NL"), 1);
        fetch.fetch(&request, &directive).await.unwrap();

        assert_eq!(transport.call_count(), 2);
    }
}
