// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process backend and cache adapters.
//!
//! [`InMemoryBackend`] keeps the keyspace in a sorted map and follows the same
//! directory rules as the etcd adapter. [`InMemorySnapshotCache`] is a plain
//! map with per-entry expiry. Both are useful for tests and for embedding a
//! store without a cluster.

use crate::adapters::keyspace::{self, Scan};
use crate::ports::{
    BackendError, BackendResult, CacheError, CacheResult, KvBackend, Listing, SnapshotCache,
    Subtree,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::{Duration, Instant};

/// Backend adapter holding the keyspace in memory.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::adapters::InMemoryBackend;
/// use etcdcfg::ports::KvBackend;
///
/// let backend = InMemoryBackend::new()
///     .with_value("/svc/name", "test");
/// assert!(backend.set_scalar("/svc/name/deeper", "x").is_err());
/// ```
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    keys: RwLock<BTreeMap<String, String>>,
}

impl InMemoryBackend {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores a raw key, bypassing the directory checks. Meant for fixtures.
    pub fn with_value(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        if let Ok(mut keys) = self.keys.write() {
            keys.insert(keyspace::normalize(&key.into()), value.into());
        }
        self
    }

    /// Returns a copy of every stored key and value, markers included.
    pub fn dump(&self) -> BackendResult<BTreeMap<String, String>> {
        Ok(self.read()?.clone())
    }

    fn read(&self) -> BackendResult<RwLockReadGuard<'_, BTreeMap<String, String>>> {
        self.keys.read().map_err(|_| BackendError::Transport {
            message: "in-memory keyspace lock poisoned".to_string(),
            source: None,
        })
    }

    fn write(&self) -> BackendResult<RwLockWriteGuard<'_, BTreeMap<String, String>>> {
        self.keys.write().map_err(|_| BackendError::Transport {
            message: "in-memory keyspace lock poisoned".to_string(),
            source: None,
        })
    }

    fn scan(keys: &BTreeMap<String, String>, path: &str) -> Scan {
        let prefix = keyspace::dir_prefix(path);
        Scan {
            path: path.to_string(),
            leaf: if path == "/" { None } else { keys.get(path).cloned() },
            descendants: keys
                .range(prefix.clone()..)
                .take_while(|(k, _)| k.starts_with(&prefix))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        }
    }

    fn check_ancestors(keys: &BTreeMap<String, String>, path: &str) -> BackendResult<()> {
        match keyspace::ancestors(path)
            .into_iter()
            .find(|ancestor| keys.contains_key(ancestor))
        {
            Some(leaf) => Err(BackendError::conflict(&leaf, "not a directory")),
            None => Ok(()),
        }
    }
}

impl KvBackend for InMemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    fn get_subtree(&self, path: &str) -> BackendResult<Subtree> {
        let path = keyspace::normalize(path);
        let keys = self.read()?;
        Self::scan(&keys, &path).subtree()
    }

    fn set_scalar(&self, path: &str, value: &str) -> BackendResult<()> {
        let path = keyspace::normalize(path);
        let mut keys = self.write()?;
        let scan = Self::scan(&keys, &path);
        if path == "/" || !scan.descendants.is_empty() {
            return Err(BackendError::conflict(&path, "not a file"));
        }
        Self::check_ancestors(&keys, &path)?;
        keys.insert(path, value.to_string());
        Ok(())
    }

    fn delete_subtree(&self, path: &str, recursive: bool) -> BackendResult<()> {
        let path = keyspace::normalize(path);
        let mut keys = self.write()?;
        let scan = Self::scan(&keys, &path);
        if scan.is_absent() {
            return Err(BackendError::not_found(&path));
        }
        if !recursive && scan.has_children() {
            return Err(BackendError::conflict(&path, "directory not empty"));
        }
        keys.remove(&path);
        for (key, _) in scan.descendants {
            keys.remove(&key);
        }
        Ok(())
    }

    fn list_children(&self, path: &str) -> BackendResult<Listing> {
        let path = keyspace::normalize(path);
        let keys = self.read()?;
        Self::scan(&keys, &path).listing()
    }

    fn make_dir(&self, path: &str) -> BackendResult<()> {
        let path = keyspace::normalize(path);
        let mut keys = self.write()?;
        let scan = Self::scan(&keys, &path);
        if scan.leaf.is_some() {
            return Err(BackendError::conflict(&path, "not a directory"));
        }
        if !scan.descendants.is_empty() {
            return Ok(());
        }
        Self::check_ancestors(&keys, &path)?;
        keys.insert(keyspace::marker_key(&path), String::new());
        Ok(())
    }
}

/// Snapshot cache adapter holding entries in memory.
#[derive(Debug, Default)]
pub struct InMemorySnapshotCache {
    entries: RwLock<HashMap<String, (String, Option<Instant>)>>,
}

impl InMemorySnapshotCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn poisoned(&self) -> CacheError {
        CacheError {
            cache: self.name().to_string(),
            message: "cache lock poisoned".to_string(),
            source: None,
        }
    }
}

impl SnapshotCache for InMemorySnapshotCache {
    fn name(&self) -> &str {
        "memory"
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| self.poisoned())?;
        Ok(entries.get(key).and_then(|(value, expires)| match expires {
            Some(at) if *at <= Instant::now() => None,
            _ => Some(value.clone()),
        }))
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        let mut entries = self.entries.write().map_err(|_| self.poisoned())?;
        let expires = ttl.map(|ttl| Instant::now() + ttl);
        entries.insert(key.to_string(), (value.to_string(), expires));
        Ok(())
    }
}
