//! Core data types for response caching.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, Instant};
use terra_abstraction::GraphqlRequest;

/// How long a cached response may be served before it is fetched again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Revalidate {
    /// Serve from cache for this many seconds.
    After(u64),
    /// Always go to the network and store nothing.
    Never,
}

/// Cache hints attached to a single request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheDirective {
    /// Freshness lifetime.
    pub revalidate: Revalidate,
    /// Invalidation tags, see `ResponseCache::revalidate_tag`.
    #[serde(default)]
    pub tags: Vec<String>,
}

impl CacheDirective {
    /// Cache for `secs` seconds.
    #[must_use]
    pub const fn after(secs: u64) -> Self {
        Self { revalidate: Revalidate::After(secs), tags: Vec::new() }
    }

    /// Never cache.
    #[must_use]
    pub const fn never() -> Self {
        Self { revalidate: Revalidate::Never, tags: Vec::new() }
    }

    /// Adds an invalidation tag.
    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.push(tag.into());
        self
    }
}

/// Cache key for identifying cached responses.
///
/// SHA-256 of the query followed by the canonical JSON of its variables.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key of a request.
    #[must_use]
    pub fn for_request(request: &GraphqlRequest) -> Self {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(request.query.as_bytes());
        hasher.update([0u8]);
        if let Some(variables) = &request.variables {
            // serde_json maps are ordered, so equal variables hash equally
            hasher.update(Value::Object(variables.clone()).to_string().as_bytes());
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// The hex digest.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A cached response with metadata.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The cached `data` payload.
    pub data: Value,
    /// Invalidation tags.
    pub tags: Vec<String>,
    /// Freshness lifetime.
    pub ttl: Duration,
    /// Timestamp when the response was stored.
    pub stored_at: Instant,
    /// Timestamp of last access.
    pub last_accessed: Instant,
}

impl CacheEntry {
    /// Create a new entry stored now.
    pub fn new(data: Value, ttl: Duration, tags: Vec<String>) -> Self {
        let now = Instant::now();
        Self { data, tags, ttl, stored_at: now, last_accessed: now }
    }

    /// Returns `true` while the entry may still be served.
    #[must_use]
    pub fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }

    /// Update the last accessed timestamp.
    pub fn touch(&mut self) {
        self.last_accessed = Instant::now();
    }
}

/// Cache statistics for observability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Total number of cache hits.
    pub total_hits: u64,
    /// Total number of cache misses (including stale entries).
    pub total_misses: u64,
    /// Total number of LRU evictions.
    pub total_evictions: u64,
    /// Total number of entries dropped by tag revalidation.
    pub total_invalidations: u64,
    /// Current number of entries in cache.
    pub cache_size: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use terra_abstraction::Variables;

    fn request_with(code: &str) -> GraphqlRequest {
        let mut variables = Variables::new();
        variables.insert("code".to_string(), json!(code));
        GraphqlRequest::new("query Country($code: ID!) { country(code: $code) { name } }")
            .with_variables(variables)
    }

    #[test]
    fn test_cache_key_depends_on_variables() {
        let key1 = CacheKey::for_request(&request_with("NL"));
        let key2 = CacheKey::for_request(&request_with("NL"));
        let key3 = CacheKey::for_request(&request_with("BE"));

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_eq!(key1.as_str().len(), 64);
    }

    #[test]
    fn test_cache_key_distinguishes_missing_variables() {
        let bare = GraphqlRequest::new("{ continents { code } }");
        let empty = GraphqlRequest::new("{ continents { code } }").with_variables(Variables::new());
        assert_ne!(CacheKey::for_request(&bare), CacheKey::for_request(&empty));
    }

    #[test]
    fn test_cache_entry_freshness() {
        let entry = CacheEntry::new(json!({}), Duration::from_secs(60), Vec::new());
        assert!(entry.is_fresh(Instant::now()));
        assert!(!entry.is_fresh(entry.stored_at + Duration::from_secs(61)));

        let expired = CacheEntry::new(json!({}), Duration::ZERO, Vec::new());
        assert!(!expired.is_fresh(Instant::now()));
    }

    #[test]
    fn test_directive_builders() {
        let directive = CacheDirective::after(3600).with_tag("country-details-NL");
        assert_eq!(directive.revalidate, Revalidate::After(3600));
        assert_eq!(directive.tags, vec!["country-details-NL".to_string()]);
        assert_eq!(CacheDirective::never().revalidate, Revalidate::Never);
    }

    #[test]
    fn test_revalidate_serde() {
        let directive: CacheDirective =
            serde_json::from_value(json!({ "revalidate": { "after": 60 }, "tags": ["a"] })).unwrap();
        assert_eq!(directive.revalidate, Revalidate::After(60));

        let never: CacheDirective = serde_json::from_value(json!({ "revalidate": "never" })).unwrap();
        assert_eq!(never, CacheDirective::never());
    }
}
