// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the configuration stores.
//!
//! [`ConfigStore`] serves reads from a tree loaded through the
//! [`CacheAsideLoader`]; [`MutableConfigStore`] adds backend writes.

pub mod builder;
pub mod config_store;
pub mod loader;
pub mod mutable_store;

// Re-export commonly used types
pub use builder::{ConfigStoreBuilder, StoreSettings};
pub use config_store::ConfigStore;
pub use loader::{CacheAsideLoader, DEFAULT_CACHE_NAMESPACE};
pub use mutable_store::MutableConfigStore;
