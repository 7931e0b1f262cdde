// SPDX-License-Identifier: MIT OR Apache-2.0

//! Store construction settings and builder.

use crate::domain::{ConfigError, Result};
use crate::ports::{KvBackend, SnapshotCache};
use crate::service::config_store::ConfigStore;
use crate::service::loader::DEFAULT_CACHE_NAMESPACE;
use crate::service::mutable_store::MutableConfigStore;
use std::sync::Arc;
use std::time::Duration;

/// Settings shared by every store kind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreSettings {
    /// Root node that every logical path is relative to
    pub root: String,
    /// Lifetime of cached snapshots; `None` keeps them until overwritten
    pub cache_ttl: Option<Duration>,
    /// Prefix of snapshot cache keys
    pub cache_namespace: String,
}

impl StoreSettings {
    /// Creates settings for `root` with no snapshot expiry.
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            cache_ttl: None,
            cache_namespace: DEFAULT_CACHE_NAMESPACE.to_string(),
        }
    }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self::new("")
    }
}

/// Builder for constructing a [`ConfigStore`] or [`MutableConfigStore`].
///
/// A backend is required; the snapshot cache is optional.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::adapters::{InMemoryBackend, InMemorySnapshotCache};
/// use etcdcfg::service::ConfigStoreBuilder;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # fn main() -> etcdcfg::domain::Result<()> {
/// let store = ConfigStoreBuilder::new()
///     .root("myapp")
///     .backend(Arc::new(InMemoryBackend::new().with_value("/myapp/name", "test")))
///     .cache(Arc::new(InMemorySnapshotCache::new()))
///     .cache_ttl(Duration::from_secs(300))
///     .build()?;
/// assert_eq!(store.root(), "myapp");
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct ConfigStoreBuilder {
    settings: StoreSettings,
    backend: Option<Arc<dyn KvBackend>>,
    cache: Option<Arc<dyn SnapshotCache>>,
}

impl ConfigStoreBuilder {
    /// Creates a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from existing settings.
    pub fn with_settings(mut self, settings: StoreSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Sets the root node.
    pub fn root(mut self, root: impl Into<String>) -> Self {
        self.settings.root = root.into();
        self
    }

    /// Sets the backend.
    pub fn backend(mut self, backend: Arc<dyn KvBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Sets the snapshot cache.
    pub fn cache(mut self, cache: Arc<dyn SnapshotCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the snapshot lifetime.
    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.settings.cache_ttl = Some(ttl);
        self
    }

    /// Sets the prefix of snapshot cache keys.
    pub fn cache_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.settings.cache_namespace = namespace.into();
        self
    }

    fn take_backend(&mut self) -> Result<Arc<dyn KvBackend>> {
        self.backend.take().ok_or_else(|| ConfigError::LoadFailure {
            root: self.settings.root.clone(),
            message: "no backend configured".to_string(),
            source: None,
        })
    }

    /// Builds a read-only store.
    pub fn build(mut self) -> Result<ConfigStore> {
        let backend = self.take_backend()?;
        ConfigStore::open(&self.settings, backend, self.cache)
    }

    /// Builds a mutable store over an existing root.
    pub fn build_mutable(mut self) -> Result<MutableConfigStore> {
        let backend = self.take_backend()?;
        MutableConfigStore::open(&self.settings, backend, self.cache)
    }

    /// Builds a mutable store, creating the root first when it is missing.
    pub fn bootstrap_mutable(mut self) -> Result<MutableConfigStore> {
        let backend = self.take_backend()?;
        MutableConfigStore::bootstrap(&self.settings, backend, self.cache)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{InMemoryBackend, InMemorySnapshotCache};
    use crate::domain::{ConfigReader, ConfigValue};

    #[test]
    fn test_builder_requires_backend() {
        let err = ConfigStoreBuilder::new().root("myapp").build().unwrap_err();
        assert!(matches!(err, ConfigError::LoadFailure { .. }));
    }

    #[test]
    fn test_builder_settings() {
        let settings = StoreSettings {
            root: "svc".to_string(),
            cache_ttl: Some(Duration::from_secs(1)),
            cache_namespace: "custom_".to_string(),
        };
        let store = ConfigStoreBuilder::new()
            .with_settings(settings)
            .backend(Arc::new(InMemoryBackend::new().with_value("/svc/a", "1")))
            .cache(Arc::new(InMemorySnapshotCache::new()))
            .build()
            .unwrap();
        assert_eq!(store.cache_key(), "custom_svc");
        assert_eq!(store.get("a").unwrap(), Some(ConfigValue::from("1")));
    }

    #[test]
    fn test_build_mutable_on_missing_root_fails() {
        let result = ConfigStoreBuilder::new()
            .root("absent")
            .backend(Arc::new(InMemoryBackend::new()))
            .build_mutable();
        assert!(matches!(result, Err(ConfigError::LoadFailure { .. })));
    }
}
