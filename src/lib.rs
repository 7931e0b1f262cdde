// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hierarchical configuration over a flat etcd keyspace.
//!
//! This crate exposes a tree of configuration values addressed by dotted
//! paths (`database.primary.host`) on top of a key-value store that only knows
//! scalar values at slash-separated keys (`/myapp/database/primary/host`).
//! The whole tree under a configured root is loaded once, optionally through
//! a snapshot cache, and every read is served from memory.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Core types and logic (`ConfigValue`, `ConfigPath`, tree
//!   building and flattening, errors)
//! - **Ports**: Trait definitions for the collaborators (`KvBackend`,
//!   `SnapshotCache`)
//! - **Adapters**: Implementations for etcd, Redis and in-memory use
//! - **Service**: The stores that tie loading, caching and writing together
//!
//! # Features
//!
//! - **Tree View**: Directories become maps, numbered directories become lists
//! - **Cache-Aside Loading**: One backend query per store, snapshot cached with a TTL
//! - **Mutation**: Set, copy and delete nodes through [`service::MutableConfigStore`]
//! - **Extensible**: Any type implementing [`ports::KvBackend`] can serve as backend
//!
//! # Feature Flags
//!
//! - `yaml`: YAML rendering and parsing of values (default)
//! - `env`: Reading etcd connection settings from the environment (default)
//! - `cli`: The `etcdcfg` command-line tool (default)
//! - `etcd`: The etcd backend
//! - `redis`: The Redis snapshot cache
//! - `remote`: Enable all remote adapters (etcd + redis)
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust
//! use etcdcfg::adapters::InMemoryBackend;
//! use etcdcfg::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<()> {
//! let backend = InMemoryBackend::new()
//!     .with_value("/myapp/servers/0", "alpha")
//!     .with_value("/myapp/servers/1", "beta");
//!
//! let store = ConfigStore::builder()
//!     .root("myapp")
//!     .backend(Arc::new(backend))
//!     .build()?;
//!
//! assert_eq!(store.require("servers")?, ConfigValue::list(["alpha", "beta"]));
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{ConfigError, ConfigMap, ConfigReader, ConfigValue, Result};
    pub use crate::ports::{KvBackend, SnapshotCache};
    pub use crate::service::{ConfigStore, ConfigStoreBuilder, MutableConfigStore, StoreSettings};

    // Re-export adapters based on feature flags
    #[cfg(feature = "etcd")]
    pub use crate::adapters::{EtcdBackend, EtcdSettings};
    #[cfg(feature = "redis")]
    pub use crate::adapters::RedisSnapshotCache;
}
