// SPDX-License-Identifier: MIT OR Apache-2.0

//! etcd and Redis example for the etcdcfg crate.
//!
//! This example demonstrates:
//! - Connecting to etcd with settings from the environment
//! - Caching the tree snapshot in Redis
//! - Bootstrapping a root that does not exist yet
//!
//! To run this example:
//! ```bash
//! # Start etcd and Redis
//! docker run -d -p 2379:2379 -e ALLOW_NONE_AUTHENTICATION=yes bitnami/etcd
//! docker run -d -p 6379:6379 redis
//!
//! export ETCD_HOST=localhost ETCD_PORT=2379
//! cargo run --example remote_store --features remote,env
//! ```

use etcdcfg::adapters::{EtcdBackend, EtcdSettings, RedisSnapshotCache};
use etcdcfg::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("=== etcdcfg: etcd + Redis ===\n");

    let settings = EtcdSettings::from_env()?;
    println!("Connecting to etcd at {:?}", settings.endpoints);
    let backend = EtcdBackend::connect(&settings)?;

    let redis_url =
        std::env::var("REDIS_URL").unwrap_or_else(|_| "redis://localhost:6379".to_string());
    let cache = RedisSnapshotCache::new(&redis_url)?;

    let mut store = ConfigStore::builder()
        .root("etcdcfg-demo")
        .backend(Arc::new(backend))
        .cache(Arc::new(cache))
        .cache_ttl(Duration::from_secs(30))
        .bootstrap_mutable()?;

    store.set_value(
        "database",
        [("host", "db.internal"), ("port", "5432")]
            .into_iter()
            .collect::<ConfigValue>(),
    )?;
    println!("✓ database = {}", store.require("database")?);
    println!("✓ read back from etcd = {}", store.fetch("database.host")?);

    store.delete("database")?;
    println!("\n=== Example Complete ===");
    Ok(())
}
