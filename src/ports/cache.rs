// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot cache trait definition.
//!
//! The cache holds serialized copies of whole configuration trees so that a
//! new store can skip the full backend fetch. Caching is best-effort: the
//! stores treat every [`CacheError`] as a miss on read and as a no-op on
//! write, and that policy is applied by the caller, not hidden in the cache.

use std::time::Duration;
use thiserror::Error;

/// An error reported by a snapshot cache.
#[derive(Debug, Error)]
#[error("Cache '{cache}' error: {message}")]
pub struct CacheError {
    /// The name of the cache that failed
    pub cache: String,
    /// The error message
    pub message: String,
    /// The underlying error, if any
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

/// A specialized Result type for cache operations.
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// A string key-value cache with optional expiry.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::adapters::InMemorySnapshotCache;
/// use etcdcfg::ports::SnapshotCache;
///
/// let cache = InMemorySnapshotCache::new();
/// cache.set("key", "{}", None).unwrap();
/// assert_eq!(cache.get("key").unwrap().as_deref(), Some("{}"));
/// assert_eq!(cache.get("other").unwrap(), None);
/// ```
pub trait SnapshotCache: Send + Sync {
    /// Returns the name of this cache, for logging.
    fn name(&self) -> &str;

    /// Fetches the value stored at `key`.
    ///
    /// `Ok(None)` means the key is absent or expired.
    fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Stores `value` at `key`, expiring after `ttl` when given.
    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()>;
}
