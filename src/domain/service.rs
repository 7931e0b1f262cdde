// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration reader trait definition.
//!
//! This module defines the `ConfigReader` trait, the read side shared by the
//! read-only and the mutable stores.

use crate::domain::{ConfigError, ConfigValue, Result};

/// Read access to a materialized configuration tree.
///
/// Only [`get_value`](ConfigReader::get_value) must be implemented; the other
/// methods are conveniences over it. Lookups never reach the backend.
///
/// # Examples
///
/// ```rust
/// use etcdcfg::domain::{ConfigReader, ConfigValue, Result};
///
/// struct Fixed;
///
/// impl ConfigReader for Fixed {
///     fn get_value(
///         &self,
///         path: &str,
///         required: bool,
///         default: Option<ConfigValue>,
///     ) -> Result<Option<ConfigValue>> {
///         if path == "app.name" {
///             Ok(Some(ConfigValue::from("MyApp")))
///         } else if required {
///             Err(etcdcfg::domain::ConfigError::NodeNotFound {
///                 path: path.to_string(),
///                 source: None,
///             })
///         } else {
///             Ok(default)
///         }
///     }
/// }
///
/// let reader = Fixed;
/// assert_eq!(reader.get("app.name").unwrap(), Some(ConfigValue::from("MyApp")));
/// assert!(reader.require("app.version").is_err());
/// ```
pub trait ConfigReader {
    /// Looks up the node at `path`.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(value))` - The node exists
    /// * `Ok(default)` - The node is absent and `required` is false
    /// * `Err(ConfigError::NodeNotFound)` - The node is absent and `required` is true
    /// * `Err(ConfigError::InvalidPath)` - `path` could not be parsed
    fn get_value(
        &self,
        path: &str,
        required: bool,
        default: Option<ConfigValue>,
    ) -> Result<Option<ConfigValue>>;

    /// Looks up an optional node.
    fn get(&self, path: &str) -> Result<Option<ConfigValue>> {
        self.get_value(path, false, None)
    }

    /// Looks up a node that must exist.
    fn require(&self, path: &str) -> Result<ConfigValue> {
        self.get_value(path, true, None)?
            .ok_or_else(|| ConfigError::NodeNotFound {
                path: path.to_string(),
                source: None,
            })
    }

    /// Looks up a node, falling back to `default` when it is absent.
    fn get_or_default(&self, path: &str, default: ConfigValue) -> Result<ConfigValue> {
        Ok(self
            .get_value(path, false, Some(default.clone()))?
            .unwrap_or(default))
    }

    /// Checks whether a node exists.
    fn has(&self, path: &str) -> bool {
        matches!(self.get(path), Ok(Some(_)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestReader;

    impl ConfigReader for TestReader {
        fn get_value(
            &self,
            path: &str,
            required: bool,
            default: Option<ConfigValue>,
        ) -> Result<Option<ConfigValue>> {
            match path {
                "test.key" => Ok(Some(ConfigValue::from("test_value"))),
                _ if required => Err(ConfigError::NodeNotFound {
                    path: path.to_string(),
                    source: None,
                }),
                _ => Ok(default),
            }
        }
    }

    #[test]
    fn test_reader_get() {
        let value = TestReader.get("test.key").unwrap();
        assert_eq!(value, Some(ConfigValue::from("test_value")));
        assert_eq!(TestReader.get("missing").unwrap(), None);
    }

    #[test]
    fn test_reader_require() {
        assert!(TestReader.require("test.key").is_ok());
        assert!(TestReader.require("missing").unwrap_err().is_not_found());
    }

    #[test]
    fn test_reader_get_or_default() {
        let value = TestReader
            .get_or_default("missing", ConfigValue::from("abc"))
            .unwrap();
        assert_eq!(value, ConfigValue::from("abc"));
    }

    #[test]
    fn test_reader_has() {
        assert!(TestReader.has("test.key"));
        assert!(!TestReader.has("missing"));
    }
}
