//! Response caching for single requests.
//!
//! This module provides the fetch-with-cache-control surface used by the
//! single-request path: a TTL and tag aware in-memory cache, and a
//! `CachingFetch` implementation that consults it before going to the network.

pub mod cache;
pub mod config;
pub mod fetch;
pub mod types;

pub use cache::ResponseCache;
pub use config::{CacheConfig, CacheConfigError};
pub use fetch::{CachedTransport, CachingFetch};
pub use types::{CacheDirective, CacheEntry, CacheKey, CacheStats, Revalidate};
