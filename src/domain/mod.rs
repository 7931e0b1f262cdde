// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core business logic and types.
//!
//! This module contains the value model, path handling, and the conversion
//! between nested values and flat backend entries. It is independent of any
//! backend or cache.

pub mod config_value;
pub mod errors;
pub mod path;
pub mod service;
pub mod tree;

// Re-export commonly used types
pub use config_value::{ConfigMap, ConfigValue};
pub use errors::{ConfigError, Result};
pub use path::{ConfigPath, PathCodec};
pub use service::ConfigReader;
pub use tree::FlatEntry;
