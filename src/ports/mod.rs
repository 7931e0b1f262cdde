// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) for the external
//! collaborators of the stores: the key-value backend and the snapshot cache.
//! These traits are implemented by adapters in the adapters layer.

pub mod backend;
pub mod cache;

// Re-export commonly used types
pub use backend::{BackendError, BackendResult, KvBackend, Listing, Subtree};
pub use cache::{CacheError, CacheResult, SnapshotCache};
