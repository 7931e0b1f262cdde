// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities and mock implementations for testing.
//!
//! This module provides backend and cache doubles that record how they are
//! called or fail on demand. It is compiled as its own test target and also
//! included by the integration tests.

#![allow(dead_code)]

use etcdcfg::adapters::{InMemoryBackend, InMemorySnapshotCache};
use etcdcfg::ports::{
    BackendError, BackendResult, CacheError, CacheResult, KvBackend, Listing, SnapshotCache,
    Subtree,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A backend that records calls and delegates to an [`InMemoryBackend`].
#[derive(Debug, Default)]
pub struct RecordingBackend {
    inner: InMemoryBackend,
    subtree_reads: AtomicUsize,
    writes: Mutex<Vec<(String, String)>>,
    fail_writes_after: Option<usize>,
}

impl RecordingBackend {
    /// Wraps a prepared in-memory backend.
    pub fn new(inner: InMemoryBackend) -> Self {
        Self {
            inner,
            ..Self::default()
        }
    }

    /// Makes every write after the first `count` fail with a transport error.
    pub fn failing_writes_after(mut self, count: usize) -> Self {
        self.fail_writes_after = Some(count);
        self
    }

    /// Number of `get_subtree` calls so far.
    pub fn subtree_reads(&self) -> usize {
        self.subtree_reads.load(Ordering::SeqCst)
    }

    /// Successful `set_scalar` calls so far, in order.
    pub fn writes(&self) -> Vec<(String, String)> {
        self.writes.lock().unwrap().clone()
    }

    /// The wrapped backend.
    pub fn inner(&self) -> &InMemoryBackend {
        &self.inner
    }
}

impl KvBackend for RecordingBackend {
    fn name(&self) -> &str {
        "recording"
    }

    fn get_subtree(&self, path: &str) -> BackendResult<Subtree> {
        self.subtree_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_subtree(path)
    }

    fn set_scalar(&self, path: &str, value: &str) -> BackendResult<()> {
        let mut writes = self.writes.lock().unwrap();
        if let Some(limit) = self.fail_writes_after {
            if writes.len() >= limit {
                return Err(BackendError::Transport {
                    message: format!("injected failure writing {}", path),
                    source: None,
                });
            }
        }
        self.inner.set_scalar(path, value)?;
        writes.push((path.to_string(), value.to_string()));
        Ok(())
    }

    fn delete_subtree(&self, path: &str, recursive: bool) -> BackendResult<()> {
        self.inner.delete_subtree(path, recursive)
    }

    fn list_children(&self, path: &str) -> BackendResult<Listing> {
        self.inner.list_children(path)
    }

    fn make_dir(&self, path: &str) -> BackendResult<()> {
        self.inner.make_dir(path)
    }
}

/// A cache that counts calls and delegates to an [`InMemorySnapshotCache`].
#[derive(Debug, Default)]
pub struct RecordingCache {
    inner: InMemorySnapshotCache,
    gets: AtomicUsize,
    sets: AtomicUsize,
}

impl RecordingCache {
    /// Creates an empty recording cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `get` calls so far.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    /// Number of `set` calls so far.
    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }
}

impl SnapshotCache for RecordingCache {
    fn name(&self) -> &str {
        "recording"
    }

    fn get(&self, key: &str) -> CacheResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.inner.set(key, value, ttl)
    }
}

/// A cache whose every call fails.
#[derive(Debug, Default)]
pub struct FailingCache {
    sets: AtomicUsize,
}

impl FailingCache {
    /// Number of attempted `set` calls.
    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    fn error(&self) -> CacheError {
        CacheError {
            cache: "failing".to_string(),
            message: "cache unavailable".to_string(),
            source: None,
        }
    }
}

impl SnapshotCache for FailingCache {
    fn name(&self) -> &str {
        "failing"
    }

    fn get(&self, _key: &str) -> CacheResult<Option<String>> {
        Err(self.error())
    }

    fn set(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        Err(self.error())
    }
}

/// Root used by the read fixtures.
pub const CONFIG_ROOT: &str = "config-test";

/// The backend fixture shared by the read tests.
pub fn base_fixture() -> InMemoryBackend {
    [
        ("nodeOne/nodeA", "A"),
        ("nodeOne/nodeB", "B"),
        ("nodeOne/nodeC/subNode", "3rd"),
        ("nodeTwo", "Two"),
        ("nodeThree/test", "test"),
        ("nodeThree/subNode/0", "00"),
        ("nodeThree/subNode/1", "11"),
        ("nodeArray/0", "Zero"),
        ("nodeArray/1", "One"),
        ("nodeArray/2", "Two"),
        ("nodePartialArray/1", "One"),
        ("nodePartialArray/2", "Two"),
    ]
    .into_iter()
    .fold(InMemoryBackend::new(), |backend, (key, value)| {
        backend.with_value(format!("/{}/{}", CONFIG_ROOT, key), value)
    })
}

#[test]
fn test_recording_backend_counts() {
    let backend = RecordingBackend::new(base_fixture());
    backend.get_subtree("/config-test").unwrap();
    backend.set_scalar("/config-test/new", "1").unwrap();
    assert_eq!(backend.subtree_reads(), 1);
    assert_eq!(backend.writes(), vec![("/config-test/new".to_string(), "1".to_string())]);
}

#[test]
fn test_recording_backend_injected_failure() {
    let backend = RecordingBackend::new(InMemoryBackend::new()).failing_writes_after(1);
    backend.set_scalar("/a", "1").unwrap();
    assert!(matches!(
        backend.set_scalar("/b", "2"),
        Err(BackendError::Transport { .. })
    ));
    assert!(!backend.inner().exists("/b").unwrap());
}

#[test]
fn test_failing_cache() {
    let cache = FailingCache::default();
    assert!(cache.get("k").is_err());
    assert!(cache.set("k", "v", None).is_err());
    assert_eq!(cache.sets(), 1);
}
