// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read-only configuration store.
//!
//! The store materializes the whole tree under its root once, at
//! construction, and answers every lookup from memory.

use crate::domain::{ConfigError, ConfigPath, ConfigReader, ConfigValue, PathCodec, Result};
use crate::ports::{KvBackend, SnapshotCache};
use crate::service::builder::{ConfigStoreBuilder, StoreSettings};
use crate::service::loader::CacheAsideLoader;
use std::sync::Arc;

/// A configuration tree loaded from a backend, optionally through a cache.
///
/// Instances never re-sync with the backend. Writes made by other clients
/// become visible to a new instance once the cached snapshot expires.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::adapters::InMemoryBackend;
/// use etcdcfg::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let backend = InMemoryBackend::new()
///     .with_value("/myapp/database/host", "localhost")
///     .with_value("/myapp/database/port", "5432");
///
/// let store = ConfigStore::builder()
///     .root("myapp")
///     .backend(Arc::new(backend))
///     .build()?;
///
/// let host = store.require("database.host")?;
/// assert_eq!(host.as_scalar(), Some("localhost"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigStore {
    pub(crate) tree: ConfigValue,
    pub(crate) codec: PathCodec,
    pub(crate) loader: CacheAsideLoader,
}

impl ConfigStore {
    /// Creates a new store builder.
    pub fn builder() -> ConfigStoreBuilder {
        ConfigStoreBuilder::new()
    }

    /// Loads the tree under `settings.root`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadFailure`] when the tree cannot be loaded.
    pub fn open(
        settings: &StoreSettings,
        backend: Arc<dyn KvBackend>,
        cache: Option<Arc<dyn SnapshotCache>>,
    ) -> Result<Self> {
        let codec = PathCodec::new(&settings.root);
        let loader = CacheAsideLoader::new(
            backend,
            cache,
            &settings.cache_namespace,
            &codec,
            settings.cache_ttl,
        );
        let tree = loader.load(&codec)?;
        Ok(Self {
            tree,
            codec,
            loader,
        })
    }

    /// The root node, without surrounding slashes.
    pub fn root(&self) -> &str {
        self.codec.root()
    }

    /// The whole materialized tree.
    pub fn tree(&self) -> &ConfigValue {
        &self.tree
    }

    /// The key under which the tree snapshot is cached.
    pub fn cache_key(&self) -> &str {
        self.loader.key()
    }
}

impl ConfigReader for ConfigStore {
    fn get_value(
        &self,
        path: &str,
        required: bool,
        default: Option<ConfigValue>,
    ) -> Result<Option<ConfigValue>> {
        let parsed = ConfigPath::parse(path)?;
        match self.tree.lookup(parsed.segments()) {
            Some(value) => Ok(Some(value.clone())),
            None if required => Err(ConfigError::NodeNotFound {
                path: path.to_string(),
                source: None,
            }),
            None => Ok(default),
        }
    }
}
