// SPDX-License-Identifier: MIT OR Apache-2.0

//! Snapshot cache example for the etcdcfg crate.
//!
//! This example demonstrates:
//! - Populating the snapshot cache on the first load
//! - Serving a second store from the cache without a backend query
//! - Refreshing the snapshot after a write
//!
//! To run this example:
//! ```bash
//! RUST_LOG=debug cargo run --example cache_aside
//! ```

use etcdcfg::adapters::{InMemoryBackend, InMemorySnapshotCache};
use etcdcfg::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    println!("=== etcdcfg: Cache-Aside Loading ===\n");

    let backend: Arc<dyn KvBackend> = Arc::new(
        InMemoryBackend::new()
            .with_value("/svc/feature/enabled", "true")
            .with_value("/svc/feature/ratio", "0.25"),
    );
    let cache = Arc::new(InMemorySnapshotCache::new());

    let open = || {
        ConfigStore::builder()
            .root("svc")
            .backend(backend.clone())
            .cache(cache.clone())
            .cache_ttl(Duration::from_secs(60))
    };

    let mut writer = open().build_mutable()?;
    println!("✓ first load cached under '{}'", writer.store().cache_key());
    if let Ok(Some(snapshot)) = cache.get(writer.store().cache_key()) {
        println!("  snapshot: {}", snapshot);
    }

    // Change the backend behind the cache's back; a new store still sees the snapshot.
    backend
        .set_scalar("/svc/feature/ratio", "0.5")
        .map_err(ConfigError::from)?;
    let reader = open().build()?;
    println!("✓ cached ratio = {}", reader.require("feature.ratio")?);

    // Writes through the mutable store refresh the snapshot.
    writer.set_value("feature.ratio", "0.75")?;
    let reader = open().build()?;
    println!("✓ refreshed ratio = {}", reader.require("feature.ratio")?);

    println!("\n=== Example Complete ===");
    Ok(())
}
