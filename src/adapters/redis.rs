// SPDX-License-Identifier: MIT OR Apache-2.0

//! Redis snapshot cache adapter.
//!
//! Snapshots are stored as plain string keys. A TTL maps to `SETEX`, whose
//! granularity is whole seconds; sub-second TTLs are rounded up to one second.

use crate::adapters::runtime::block_on;
use crate::ports::{CacheError, CacheResult, SnapshotCache};
use redis::aio::MultiplexedConnection;
use redis::{AsyncCommands, Client};
use std::time::Duration;

fn cache_error(message: &str, e: redis::RedisError) -> CacheError {
    CacheError {
        cache: "redis".to_string(),
        message: format!("{}: {}", message, e),
        source: Some(Box::new(e)),
    }
}

/// Snapshot cache backed by Redis.
///
/// The connection is multiplexed and opened once, so the cache can be shared
/// between threads.
///
/// # Examples
///
/// ```rust,no_run
/// use etcdcfg::adapters::RedisSnapshotCache;
/// use etcdcfg::ports::SnapshotCache;
/// use std::time::Duration;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let cache = RedisSnapshotCache::new("redis://localhost:6379")?;
/// cache.set("etcd_config_myapp", "{}", Some(Duration::from_secs(60)))?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct RedisSnapshotCache {
    connection: MultiplexedConnection,
    url: String,
}

impl std::fmt::Debug for RedisSnapshotCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisSnapshotCache")
            .field("url", &self.url)
            .finish_non_exhaustive()
    }
}

impl RedisSnapshotCache {
    /// Connects to the Redis server at `url` (e.g. `"redis://localhost:6379"`).
    pub fn new(url: &str) -> CacheResult<Self> {
        let client = Client::open(url).map_err(|e| cache_error("Failed to create Redis client", e))?;
        let connection = block_on(client.get_multiplexed_async_connection())
            .map_err(|e| cache_error("Failed to connect to Redis", e))?;
        tracing::debug!("Connected to Redis at {}", url);
        Ok(Self {
            connection,
            url: url.to_string(),
        })
    }
}

/// Converts a TTL to whole seconds, never below one.
fn ttl_seconds(ttl: Duration) -> usize {
    let secs = ttl.as_secs() + u64::from(ttl.subsec_nanos() > 0);
    usize::try_from(secs.max(1)).unwrap_or(usize::MAX)
}

impl SnapshotCache for RedisSnapshotCache {
    fn name(&self) -> &str {
        "redis"
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut conn = self.connection.clone();
        block_on(async move { conn.get::<_, Option<String>>(key).await })
            .map_err(|e| cache_error("Failed to read snapshot from Redis", e))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut conn = self.connection.clone();
        block_on(async move {
            match ttl {
                Some(ttl) => conn.set_ex::<_, _, ()>(key, value, ttl_seconds(ttl)).await,
                None => conn.set::<_, _, ()>(key, value).await,
            }
        })
        .map_err(|e| cache_error("Failed to write snapshot to Redis", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_seconds_rounds_up() {
        assert_eq!(ttl_seconds(Duration::from_secs(60)), 60);
        assert_eq!(ttl_seconds(Duration::from_millis(1500)), 2);
        assert_eq!(ttl_seconds(Duration::from_millis(10)), 1);
        assert_eq!(ttl_seconds(Duration::ZERO), 1);
    }

    #[test]
    fn test_invalid_url() {
        let err = RedisSnapshotCache::new("not a url").unwrap_err();
        assert_eq!(err.cache, "redis");
    }
}
