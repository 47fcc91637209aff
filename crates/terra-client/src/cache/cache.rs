//! ResponseCache implementation with TTL, tag revalidation and LRU eviction.

use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::config::{CacheConfig, CacheConfigError};
use super::types::{CacheEntry, CacheKey, CacheStats};

/// In-memory cache of GraphQL responses.
///
/// Cloning yields another handle to the same storage, so one handle can
/// serve requests while another revalidates tags.
#[derive(Debug, Clone)]
pub struct ResponseCache {
    /// The cache storage (key -> cached response).
    cache: Arc<RwLock<HashMap<CacheKey, CacheEntry>>>,
    /// Cache configuration.
    config: CacheConfig,
    /// Cache statistics.
    stats: Arc<RwLock<CacheStats>>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

impl ResponseCache {
    /// Create a new response cache with the given configuration.
    ///
    /// # Errors
    /// Returns `CacheConfigError` if the configuration is invalid.
    pub fn new(config: CacheConfig) -> Result<Self, CacheConfigError> {
        config.validate()?;

        Ok(Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            config,
            stats: Arc::new(RwLock::new(CacheStats::default())),
        })
    }

    /// Look up a fresh response.
    ///
    /// Stale entries are removed and counted as misses.
    pub fn get(&self, key: &CacheKey) -> Option<Value> {
        if !self.config.enabled {
            return None;
        }

        let now = Instant::now();
        let mut cache = write(&self.cache);
        let fresh = cache.get(key).map(|entry| entry.is_fresh(now));
        let hit = match fresh {
            Some(true) => cache.get_mut(key).map(|entry| {
                entry.touch();
                entry.data.clone()
            }),
            Some(false) => {
                cache.remove(key);
                debug!(key = %key.as_str(), "Cache entry expired");
                None
            }
            None => None,
        };

        let mut stats = write(&self.stats);
        if hit.is_some() {
            stats.total_hits += 1;
        } else {
            stats.total_misses += 1;
        }
        stats.cache_size = cache.len();
        hit
    }

    /// Store a response.
    ///
    /// If the cache is full, the least-recently-used entry is evicted first.
    pub fn insert(&self, key: CacheKey, data: Value, ttl: Duration, tags: Vec<String>) {
        if !self.config.enabled {
            return;
        }

        let mut cache = write(&self.cache);
        if !cache.contains_key(&key) && cache.len() >= self.config.max_entries {
            if let Some(lru_key) = Self::find_lru_key(&cache) {
                cache.remove(&lru_key);
                write(&self.stats).total_evictions += 1;
                debug!(key = %lru_key.as_str(), "Evicted LRU response from cache");
            }
        }

        cache.insert(key, CacheEntry::new(data, ttl, tags));
        write(&self.stats).cache_size = cache.len();
    }

    /// Find the least-recently-used key in the cache.
    fn find_lru_key(cache: &HashMap<CacheKey, CacheEntry>) -> Option<CacheKey> {
        cache
            .iter()
            .min_by_key(|(_, entry)| entry.last_accessed)
            .map(|(key, _)| key.clone())
    }

    /// Drop every entry carrying `tag`.
    ///
    /// # Returns
    /// The number of entries removed.
    pub fn revalidate_tag(&self, tag: &str) -> usize {
        let mut cache = write(&self.cache);
        let before = cache.len();
        cache.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        let removed = before - cache.len();

        let mut stats = write(&self.stats);
        stats.total_invalidations += removed as u64;
        stats.cache_size = cache.len();
        drop(stats);

        info!(tag, removed, "Revalidated cache tag");
        removed
    }

    /// Remove a specific response from the cache.
    ///
    /// # Returns
    /// `true` if the response was removed, `false` if it was not found.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let mut cache = write(&self.cache);
        let removed = cache.remove(key).is_some();
        write(&self.stats).cache_size = cache.len();
        removed
    }

    /// Clear all responses from the cache.
    pub fn clear(&self) {
        let mut cache = write(&self.cache);
        let cleared_count = cache.len();
        cache.clear();
        write(&self.stats).cache_size = 0;
        info!(cleared_count, "Cleared response cache");
    }

    /// Get current cache statistics.
    #[must_use]
    pub fn get_stats(&self) -> CacheStats {
        let mut result = read(&self.stats).clone();
        result.cache_size = read(&self.cache).len();
        result
    }

    /// Get the cache configuration.
    #[must_use]
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }
}
