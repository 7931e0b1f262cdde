// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters layer containing backend and cache implementations.
//!
//! This module contains concrete implementations of the [`KvBackend`] and
//! [`SnapshotCache`] traits defined in the ports layer. The in-memory pair is
//! always available; the etcd and Redis adapters are behind feature flags.
//!
//! [`KvBackend`]: crate::ports::KvBackend
//! [`SnapshotCache`]: crate::ports::SnapshotCache

pub(crate) mod keyspace;
pub mod memory;
#[cfg(any(feature = "etcd", feature = "redis"))]
pub(crate) mod runtime;

#[cfg(feature = "etcd")]
pub mod etcd;
#[cfg(feature = "redis")]
pub mod redis;

pub use memory::{InMemoryBackend, InMemorySnapshotCache};

// Re-export adapters based on feature flags
#[cfg(feature = "etcd")]
pub use etcd::{EtcdBackend, EtcdSettings};
#[cfg(feature = "redis")]
pub use redis::RedisSnapshotCache;
