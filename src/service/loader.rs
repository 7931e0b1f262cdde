// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cache-aside loading of the configuration tree.
//!
//! A snapshot in the cache is trusted as the complete tree. Without one, the
//! whole root subtree is fetched from the backend in a single query and the
//! result is written back to the cache. Cache failures of any kind count as a
//! miss on read and are ignored on write.

use crate::domain::tree;
use crate::domain::{ConfigError, ConfigValue, PathCodec, Result};
use crate::ports::{KvBackend, SnapshotCache};
use std::sync::Arc;
use std::time::Duration;

/// Default namespace prefix of snapshot cache keys.
///
/// Deployments that cached snapshots under the older `tutu_env_config_etcd_`
/// prefix must pass it explicitly through
/// [`StoreSettings::cache_namespace`](crate::service::StoreSettings::cache_namespace),
/// otherwise those snapshots are never read.
pub const DEFAULT_CACHE_NAMESPACE: &str = "etcd_config_";

/// Characters that are replaced by `_` when deriving a cache key.
const UNSAFE_KEY_CHARS: [char; 8] = ['{', '}', '(', ')', '/', '\'', '@', ':'];

/// Loads the tree for one root, consulting a snapshot cache first.
pub struct CacheAsideLoader {
    backend: Arc<dyn KvBackend>,
    cache: Option<Arc<dyn SnapshotCache>>,
    cache_key: String,
    ttl: Option<Duration>,
}

impl std::fmt::Debug for CacheAsideLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAsideLoader")
            .field("backend", &self.backend.name())
            .field("cache", &self.cache.as_ref().map(|c| c.name()))
            .field("cache_key", &self.cache_key)
            .field("ttl", &self.ttl)
            .finish()
    }
}

impl CacheAsideLoader {
    /// Creates a loader for the root of `codec`.
    pub fn new(
        backend: Arc<dyn KvBackend>,
        cache: Option<Arc<dyn SnapshotCache>>,
        namespace: &str,
        codec: &PathCodec,
        ttl: Option<Duration>,
    ) -> Self {
        Self {
            backend,
            cache,
            cache_key: Self::cache_key(namespace, codec.root()),
            ttl,
        }
    }

    /// Derives the snapshot cache key for a root node.
    ///
    /// # Examples
    ///
    /// ```
    /// use etcdcfg::service::CacheAsideLoader;
    ///
    /// assert_eq!(
    ///     CacheAsideLoader::cache_key("etcd_config_", "/svc/{eu}:main/"),
    ///     "etcd_config_svc__eu__main"
    /// );
    /// ```
    pub fn cache_key(namespace: &str, root: &str) -> String {
        let root: String = PathCodec::trim(root)
            .chars()
            .map(|c| if UNSAFE_KEY_CHARS.contains(&c) { '_' } else { c })
            .collect();
        format!("{}{}", namespace, root)
    }

    /// The cache key used by this loader.
    pub fn key(&self) -> &str {
        &self.cache_key
    }

    /// The backend this loader reads from.
    pub fn backend(&self) -> &Arc<dyn KvBackend> {
        &self.backend
    }

    /// Returns the tree for `codec`'s root.
    ///
    /// A cache hit does not touch the backend. On a miss the root subtree is
    /// fetched once and the snapshot cache is populated once.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadFailure`] when the backend query fails or the
    /// root is a leaf.
    pub fn load(&self, codec: &PathCodec) -> Result<ConfigValue> {
        if let Some(tree) = self.read_snapshot() {
            tracing::debug!("Loaded configuration '{}' from cache", self.cache_key);
            return Ok(tree);
        }

        let root_path = codec.root_path();
        let entries = self
            .backend
            .get_subtree(&root_path)
            .map_err(|e| ConfigError::LoadFailure {
                root: codec.root().to_string(),
                message: format!("Can't read {} directory '{}'", self.backend.name(), root_path),
                source: Some(Box::new(e)),
            })?;
        if let [(key, _)] = entries.as_slice() {
            if key.is_empty() {
                return Err(ConfigError::LoadFailure {
                    root: codec.root().to_string(),
                    message: format!("'{}' is a leaf, not a directory", root_path),
                    source: None,
                });
            }
        }

        let tree = tree::build(&entries, None);
        tracing::info!(
            "Loaded {} configuration entries under '{}' from {}",
            entries.len(),
            root_path,
            self.backend.name()
        );
        self.refresh(&tree);
        Ok(tree)
    }

    /// Overwrites the cached snapshot with `tree`. Failures are logged only.
    pub fn refresh(&self, tree: &ConfigValue) {
        let Some(cache) = &self.cache else {
            return;
        };
        let snapshot = match serde_json::to_string(tree) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Failed to serialize snapshot '{}': {}", self.cache_key, e);
                return;
            }
        };
        if let Err(e) = cache.set(&self.cache_key, &snapshot, self.ttl) {
            tracing::warn!("Failed to store snapshot '{}': {}", self.cache_key, e);
        }
    }

    fn read_snapshot(&self) -> Option<ConfigValue> {
        let cache = self.cache.as_ref()?;
        let snapshot = match cache.get(&self.cache_key) {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                tracing::debug!("Cache miss for '{}'", self.cache_key);
                return None;
            }
            Err(e) => {
                tracing::debug!("Treating cache error as miss for '{}': {}", self.cache_key, e);
                return None;
            }
        };
        match serde_json::from_str::<ConfigValue>(&snapshot) {
            Ok(tree @ ConfigValue::Composite(_)) => Some(tree),
            Ok(ConfigValue::Scalar(_)) => {
                tracing::warn!("Ignoring scalar snapshot '{}'", self.cache_key);
                None
            }
            Err(e) => {
                tracing::warn!("Ignoring unreadable snapshot '{}': {}", self.cache_key, e);
                None
            }
        }
    }
}
