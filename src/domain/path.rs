// SPDX-License-Identifier: MIT OR Apache-2.0

//! Logical and backend path handling.
//!
//! Callers address nodes with dotted paths (`database.primary.host`); the
//! backend stores leaves at slash-delimited absolute keys
//! (`/service/database/primary/host`). A logical path may also be written
//! with slashes (`database/primary/host`), in which case dots are plain
//! characters of a segment.

use crate::domain::errors::{ConfigError, Result};
use std::fmt;

/// Separator of caller-facing paths.
pub const LOGICAL_SEPARATOR: char = '.';

/// Separator of backend keys.
pub const BACKEND_SEPARATOR: char = '/';

/// A parsed logical path: the sequence of segments below the store root.
///
/// Leading and trailing separators are ignored, so `"a.b"`, `".a.b."` and
/// `"/a/b/"` are the same path. The empty path addresses the root itself.
///
/// # Examples
///
/// ```
/// use etcdcfg::domain::ConfigPath;
///
/// let path = ConfigPath::parse("nodeOne.nodeC").unwrap();
/// assert_eq!(path.segments(), ["nodeOne", "nodeC"]);
/// assert_eq!(path, ConfigPath::parse("/nodeOne/nodeC/").unwrap());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ConfigPath {
    segments: Vec<String>,
}

impl ConfigPath {
    /// The path of the store root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parses a dotted or slash-delimited path.
    ///
    /// A path containing the backend separator is split on it alone; any other
    /// path is split on dots. Empty inner segments (`"a..b"`) are rejected.
    pub fn parse(path: &str) -> Result<Self> {
        let separator = if path.contains(BACKEND_SEPARATOR) {
            BACKEND_SEPARATOR
        } else {
            LOGICAL_SEPARATOR
        };
        let trimmed = path.trim_matches(separator);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }
        let segments = trimmed
            .split(separator)
            .map(|segment| {
                if segment.is_empty() {
                    Err(ConfigError::invalid_path(path, "empty path segment"))
                } else {
                    Ok(segment.to_string())
                }
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { segments })
    }

    /// Returns the segments.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// True for the root path.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The final segment, or `None` for the root.
    pub fn last(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Returns a new path with `segment` appended.
    pub fn child(&self, segment: &str) -> Result<Self> {
        PathCodec::check_segment(segment)?;
        let mut segments = self.segments.clone();
        segments.push(segment.to_string());
        Ok(Self { segments })
    }
}

impl fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for segment in &self.segments {
            if !first {
                write!(f, "{}", LOGICAL_SEPARATOR)?;
            }
            write!(f, "{}", segment)?;
            first = false;
        }
        Ok(())
    }
}

/// Conversions between logical paths and backend keys under a fixed root.
///
/// # Examples
///
/// ```
/// use etcdcfg::domain::{ConfigPath, PathCodec};
///
/// let codec = PathCodec::new("/config-test/");
/// let path = ConfigPath::parse("nodeOne.nodeA").unwrap();
/// assert_eq!(codec.to_backend_path(&path), "/config-test/nodeOne/nodeA");
/// assert_eq!(codec.root_path(), "/config-test");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PathCodec {
    root: String,
}

impl PathCodec {
    /// Creates a codec for the given root node. Surrounding slashes are ignored.
    pub fn new(root: &str) -> Self {
        Self {
            root: Self::trim(root).to_string(),
        }
    }

    /// The root node without surrounding slashes.
    pub fn root(&self) -> &str {
        &self.root
    }

    /// The absolute backend key of the root node.
    pub fn root_path(&self) -> String {
        format!("{}{}", BACKEND_SEPARATOR, self.root)
    }

    /// Strips leading and trailing backend separators.
    pub fn trim(path: &str) -> &str {
        path.trim_matches(BACKEND_SEPARATOR)
    }

    /// Joins a segment onto a backend path.
    ///
    /// Segments containing the backend separator would silently address a
    /// deeper node and are rejected.
    pub fn join(base: &str, segment: &str) -> Result<String> {
        Self::check_segment(segment)?;
        let base = base.trim_end_matches(BACKEND_SEPARATOR);
        Ok(format!("{}{}{}", base, BACKEND_SEPARATOR, segment))
    }

    /// Converts a logical path into its absolute backend key.
    pub fn to_backend_path(&self, path: &ConfigPath) -> String {
        let mut key = self.root_path();
        for segment in path.segments() {
            if !key.ends_with(BACKEND_SEPARATOR) {
                key.push(BACKEND_SEPARATOR);
            }
            key.push_str(segment);
        }
        key
    }

    fn check_segment(segment: &str) -> Result<()> {
        if segment.is_empty() {
            return Err(ConfigError::invalid_path(segment, "empty path segment"));
        }
        if segment.contains(BACKEND_SEPARATOR) {
            return Err(ConfigError::invalid_path(
                segment,
                format!("segment contains '{}'", BACKEND_SEPARATOR),
            ));
        }
        Ok(())
    }
}
