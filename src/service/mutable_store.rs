// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration store with write access to the backend.
//!
//! Multi-leaf writes are not atomic. Leaves are written one at a time in
//! [`flatten`](crate::domain::tree::flatten) order, and when a write fails the
//! leaves written before it stay in the backend. The in-memory tree and the
//! cached snapshot are only updated after every write has succeeded.

use crate::domain::tree::{self, FlatEntry};
use crate::domain::{ConfigError, ConfigPath, ConfigReader, ConfigValue, PathCodec, Result};
use crate::ports::{BackendError, KvBackend, Listing, SnapshotCache};
use crate::service::builder::StoreSettings;
use crate::service::config_store::ConfigStore;
use std::sync::Arc;

/// A [`ConfigStore`] that can also write, copy and delete nodes.
///
/// Reads are served from the in-memory tree exactly as in [`ConfigStore`].
/// Every successful write patches that tree and rewrites the cached snapshot.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::adapters::InMemoryBackend;
/// use etcdcfg::prelude::*;
/// use std::sync::Arc;
///
/// # fn main() -> Result<()> {
/// let mut store = ConfigStore::builder()
///     .root("myapp")
///     .backend(Arc::new(InMemoryBackend::new()))
///     .bootstrap_mutable()?;
///
/// store.set_value("database.host", "localhost")?;
/// assert_eq!(store.require("database.host")?.as_scalar(), Some("localhost"));
///
/// store.copy("database", "replica")?;
/// assert!(store.has("replica.host"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MutableConfigStore {
    store: ConfigStore,
}

impl MutableConfigStore {
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
        Ok(Self {
            store: ConfigStore::open(settings, backend, cache)?,
        })
    }

    /// Creates the root directory if needed, then loads the tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LoadFailure`] when the root cannot be created
    /// or loaded.
    pub fn bootstrap(
        settings: &StoreSettings,
        backend: Arc<dyn KvBackend>,
        cache: Option<Arc<dyn SnapshotCache>>,
    ) -> Result<Self> {
        let root_path = PathCodec::new(&settings.root).root_path();
        ensure_dir(backend.as_ref(), &root_path).map_err(|e| ConfigError::LoadFailure {
            root: settings.root.clone(),
            message: format!("Can't create root directory '{}'", root_path),
            source: Some(Box::new(e)),
        })?;
        Self::open(settings, backend, cache)
    }

    /// The read-only view of this store.
    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    fn backend(&self) -> &dyn KvBackend {
        self.store.loader.backend().as_ref()
    }

    /// Writes `value` at `path`.
    ///
    /// Composite values are written leaf by leaf. An empty composite creates
    /// an empty directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UpdateForbidden`] when the backend rejects a
    /// write, for example a scalar over an existing directory or a write
    /// below an existing leaf. Leaves written before the failure remain.
    pub fn set_value(&mut self, path: &str, value: impl Into<ConfigValue>) -> Result<()> {
        let value = value.into();
        let parsed = ConfigPath::parse(path)?;
        let key = self.store.codec.to_backend_path(&parsed);
        let entries = tree::flatten(&key, &value)?;

        let forbidden = |source: BackendError| ConfigError::UpdateForbidden {
            path: path.to_string(),
            source,
        };
        if entries.is_empty() && !value.is_scalar() {
            self.backend().make_dir(&key).map_err(forbidden)?;
        }
        for (written, FlatEntry { path: leaf, value: scalar }) in entries.iter().enumerate() {
            tracing::debug!("Writing '{}' to {}", leaf, self.backend().name());
            if let Err(e) = self.backend().set_scalar(leaf, scalar) {
                if written > 0 {
                    tracing::warn!(
                        "Write of '{}' failed after {} of {} leaves were stored",
                        path,
                        written,
                        entries.len()
                    );
                }
                return Err(forbidden(e));
            }
        }

        self.store.tree.set_at(parsed.segments(), value);
        self.store.loader.refresh(&self.store.tree);
        Ok(())
    }

    /// Reads the value at `path` directly from the backend.
    ///
    /// A node holding a single leaf named like the node itself reads back as
    /// that scalar.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NodeNotFound`] when `path` does not exist.
    pub fn fetch(&self, path: &str) -> Result<ConfigValue> {
        let parsed = ConfigPath::parse(path)?;
        let key = self.store.codec.to_backend_path(&parsed);
        let entries = self
            .backend()
            .get_subtree(&key)
            .map_err(|e| not_found_or_backend(path, e))?;
        Ok(tree::build(&entries, parsed.last()))
    }

    /// Copies the node at `src`, leaf or subtree, to `dst`.
    ///
    /// The source is read from the backend, not from the in-memory tree.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NodeNotFound`] when `src` does not exist, and
    /// [`ConfigError::UpdateForbidden`] when `dst` cannot take the value, such
    /// as a leaf copied onto an existing directory.
    pub fn copy(&mut self, src: &str, dst: &str) -> Result<()> {
        let parsed = ConfigPath::parse(src)?;
        let key = self.store.codec.to_backend_path(&parsed);
        let value = match self
            .backend()
            .list_children(&key)
            .map_err(|e| not_found_or_backend(src, e))?
        {
            Listing::Leaf(value) => ConfigValue::Scalar(value),
            Listing::Directory(_) => {
                let entries = self
                    .backend()
                    .get_subtree(&key)
                    .map_err(|e| not_found_or_backend(src, e))?;
                tree::build(&entries, None)
            }
        };
        tracing::debug!("Copying '{}' to '{}'", src, dst);
        self.set_value(dst, value)
    }

    /// Deletes the leaf or subtree at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NodeNotFound`] when `path` does not exist.
    pub fn delete(&mut self, path: &str) -> Result<()> {
        let parsed = ConfigPath::parse(path)?;
        let key = self.store.codec.to_backend_path(&parsed);
        self.backend()
            .delete_subtree(&key, true)
            .map_err(|e| not_found_or_backend(path, e))?;

        if parsed.is_root() {
            self.store.tree = ConfigValue::empty();
        } else {
            self.store.tree.remove_at(parsed.segments());
        }
        self.store.loader.refresh(&self.store.tree);
        Ok(())
    }

    /// Creates the root directory if it does not exist yet.
    ///
    /// Calling it again, or after values were written, does nothing.
    pub fn init(&self) -> Result<()> {
        let root_path = self.store.codec.root_path();
        ensure_dir(self.backend(), &root_path)?;
        Ok(())
    }
}

fn ensure_dir(backend: &dyn KvBackend, path: &str) -> std::result::Result<(), BackendError> {
    if backend.exists(path)? {
        tracing::debug!("Directory '{}' already exists", path);
        return Ok(());
    }
    backend.make_dir(path)?;
    tracing::info!("Created directory '{}' in {}", path, backend.name());
    Ok(())
}

fn not_found_or_backend(path: &str, error: BackendError) -> ConfigError {
    match error {
        e @ BackendError::NotFound { .. } => ConfigError::NodeNotFound {
            path: path.to_string(),
            source: Some(e),
        },
        e => ConfigError::Backend(e),
    }
}

impl ConfigReader for MutableConfigStore {
    fn get_value(
        &self,
        path: &str,
        required: bool,
        default: Option<ConfigValue>,
    ) -> Result<Option<ConfigValue>> {
        self.store.get_value(path, required, default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::InMemoryBackend;

    fn store() -> (MutableConfigStore, Arc<InMemoryBackend>) {
        let backend = Arc::new(
            InMemoryBackend::new()
                .with_value("/r/name", "test")
                .with_value("/r/nodeOne/nodeA", "A"),
        );
        let store =
            MutableConfigStore::open(&StoreSettings::new("r"), backend.clone(), None).unwrap();
        (store, backend)
    }

    #[test]
    fn test_set_value_updates_tree_and_backend() {
        let (mut store, backend) = store();
        store.set_value("nodeOne.nodeB", "B").unwrap();
        assert_eq!(store.get("nodeOne.nodeB").unwrap(), Some(ConfigValue::from("B")));
        assert_eq!(store.get("nodeOne.nodeA").unwrap(), Some(ConfigValue::from("A")));
        assert_eq!(
            backend.dump().unwrap().get("/r/nodeOne/nodeB").map(String::as_str),
            Some("B")
        );
    }

    #[test]
    fn test_set_scalar_over_directory_is_forbidden() {
        let (mut store, _) = store();
        let err = store.set_value("nodeOne", "flat").unwrap_err();
        assert!(matches!(err, ConfigError::UpdateForbidden { .. }));
        assert!(err.is_conflict());
        assert!(store.get("nodeOne.nodeA").unwrap().is_some());
    }

    #[test]
    fn test_set_empty_composite_creates_directory() {
        let (mut store, backend) = store();
        store.set_value("empty", ConfigValue::empty()).unwrap();
        assert!(backend.exists("/r/empty").unwrap());
        assert_eq!(store.get("empty").unwrap(), Some(ConfigValue::empty()));
    }

    #[test]
    fn test_fetch_collapses_leaf() {
        let (store, _) = store();
        assert_eq!(store.fetch("name").unwrap(), ConfigValue::from("test"));
        assert_eq!(
            store.fetch("nodeOne").unwrap(),
            [("nodeA", "A")].into_iter().collect()
        );
        assert!(store.fetch("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_updates_tree() {
        let (mut store, backend) = store();
        store.delete("nodeOne").unwrap();
        assert!(!store.has("nodeOne"));
        assert!(!backend.exists("/r/nodeOne").unwrap());
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let (mut store, _) = store();
        let err = store.delete("missing").unwrap_err();
        assert!(matches!(err, ConfigError::NodeNotFound { source: Some(_), .. }));
    }

    #[test]
    fn test_init_is_idempotent() {
        let (store, backend) = store();
        let before = backend.dump().unwrap();
        store.init().unwrap();
        store.init().unwrap();
        assert_eq!(backend.dump().unwrap(), before);
    }

    #[test]
    fn test_bootstrap_creates_root() {
        let backend = Arc::new(InMemoryBackend::new());
        let store =
            MutableConfigStore::bootstrap(&StoreSettings::new("fresh"), backend.clone(), None)
                .unwrap();
        assert_eq!(store.store().tree(), &ConfigValue::empty());
        assert!(backend.exists("/fresh").unwrap());
    }
}
