// SPDX-License-Identifier: MIT OR Apache-2.0

//! Basic usage example for the etcdcfg crate.
//!
//! This example demonstrates:
//! - Loading a configuration tree from a backend
//! - Reading scalars, maps and lists by dotted path
//! - Using default values for missing paths
//! - Writing, copying and deleting nodes
//!
//! The in-memory backend stands in for etcd, so nothing needs to be running.
//!
//! To run this example:
//! ```bash
//! cargo run --example basic_usage
//! ```

use etcdcfg::adapters::InMemoryBackend;
use etcdcfg::prelude::*;
use std::sync::Arc;

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt::init();

    println!("=== etcdcfg: Basic Usage ===\n");

    let backend = InMemoryBackend::new()
        .with_value("/myapp/app/name", "MyApplication")
        .with_value("/myapp/database/host", "localhost")
        .with_value("/myapp/database/port", "5432")
        .with_value("/myapp/servers/0", "alpha")
        .with_value("/myapp/servers/1", "beta");

    let mut store = ConfigStore::builder()
        .root("myapp")
        .backend(Arc::new(backend))
        .build_mutable()?;

    // Example 1: Scalars
    println!("--- Example 1: Scalar Values ---");
    let name = store.require("app.name")?;
    println!("✓ app.name = {}", name);

    // Example 2: Whole subtrees
    println!("\n--- Example 2: Subtrees ---");
    println!("✓ database = {}", store.require("database")?);
    println!("✓ servers  = {}", store.require("servers")?);

    // Example 3: Defaults
    println!("\n--- Example 3: Defaults ---");
    let timeout = store.get_or_default("database.timeout", ConfigValue::from("30"))?;
    println!("✓ database.timeout (default) = {}", timeout);

    // Example 4: Writes
    println!("\n--- Example 4: Writes ---");
    store.set_value("database.user", "admin")?;
    store.copy("database", "replica")?;
    store.set_value("replica.host", "replica.internal")?;
    println!("✓ replica = {}", store.require("replica")?);

    match store.set_value("database", "flat") {
        Ok(()) => println!("✗ overwrote a directory with a scalar"),
        Err(e) => println!("✓ refused: {}", e),
    }

    store.delete("replica")?;
    println!("✓ replica deleted: present = {}", store.has("replica"));

    println!("\n=== Example Complete ===");
    Ok(())
}
