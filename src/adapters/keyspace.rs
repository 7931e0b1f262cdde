// SPDX-License-Identifier: MIT OR Apache-2.0

//! Directory emulation over a flat keyspace.
//!
//! Flat stores only know keys. A path is a leaf when a key with exactly that
//! name exists, and a directory when any key lies below `path/`. An empty
//! directory is kept alive by a marker key `path/` holding an empty value.
//! Backends fetch the relevant keys into a [`Scan`] and let it answer.

use crate::ports::{BackendError, BackendResult, Listing, Subtree};

/// Separator of backend keys.
const SEPARATOR: char = '/';

/// Normalizes a backend path to `/a/b` form; the root is `/`.
pub(crate) fn normalize(path: &str) -> String {
    let trimmed = path.trim_matches(SEPARATOR);
    format!("{}{}", SEPARATOR, trimmed)
}

/// The key prefix shared by everything below `path`.
pub(crate) fn dir_prefix(path: &str) -> String {
    if path.ends_with(SEPARATOR) {
        path.to_string()
    } else {
        format!("{}{}", path, SEPARATOR)
    }
}

/// The key of the marker that keeps an empty directory at `path` alive.
pub(crate) fn marker_key(path: &str) -> String {
    dir_prefix(path)
}

/// True for directory marker keys.
pub(crate) fn is_marker(key: &str) -> bool {
    key.ends_with(SEPARATOR)
}

/// Proper ancestors of `path`, outermost first, excluding the root.
pub(crate) fn ancestors(path: &str) -> Vec<String> {
    let mut result = Vec::new();
    let mut current = String::new();
    let segments: Vec<&str> = path.split(SEPARATOR).filter(|s| !s.is_empty()).collect();
    if let Some((_, parents)) = segments.split_last() {
        for segment in parents {
            current.push(SEPARATOR);
            current.push_str(segment);
            result.push(current.clone());
        }
    }
    result
}

/// The keys found at and below one path.
#[derive(Debug, Default)]
pub(crate) struct Scan {
    /// Normalized path that was scanned
    pub path: String,
    /// Value of the key named exactly `path`, if it exists
    pub leaf: Option<String>,
    /// Keys starting with `path/`, with values, in key order
    pub descendants: Vec<(String, String)>,
}

impl Scan {
    /// True when nothing exists at `path`.
    pub fn is_absent(&self) -> bool {
        self.leaf.is_none() && self.descendants.is_empty()
    }

    /// True when `path` is a directory with something other than its own marker.
    pub fn has_children(&self) -> bool {
        let own_marker = marker_key(&self.path);
        self.descendants.iter().any(|(k, _)| *k != own_marker)
    }

    fn relative<'a>(&self, key: &'a str) -> &'a str {
        let prefix_len = dir_prefix(&self.path).len();
        key.get(prefix_len..).unwrap_or("")
    }

    /// Leaves below `path`, relative to it. A leaf yields `("", value)`.
    pub fn subtree(&self) -> BackendResult<Subtree> {
        if let Some(value) = &self.leaf {
            return Ok(vec![(String::new(), value.clone())]);
        }
        if self.descendants.is_empty() {
            return Err(BackendError::not_found(&self.path));
        }
        Ok(self
            .descendants
            .iter()
            .filter(|(k, _)| !is_marker(k))
            .map(|(k, v)| (self.relative(k).to_string(), v.clone()))
            .collect())
    }

    /// Leaf value or immediate child names of `path`.
    pub fn listing(&self) -> BackendResult<Listing> {
        if let Some(value) = &self.leaf {
            return Ok(Listing::Leaf(value.clone()));
        }
        if self.descendants.is_empty() {
            return Err(BackendError::not_found(&self.path));
        }
        let mut children: Vec<String> = Vec::new();
        for (key, _) in &self.descendants {
            if let Some(name) = self.relative(key).split(SEPARATOR).next() {
                if !name.is_empty() && !children.iter().any(|c| c == name) {
                    children.push(name.to_string());
                }
            }
        }
        Ok(Listing::Directory(children))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(path: &str, leaf: Option<&str>, descendants: &[(&str, &str)]) -> Scan {
        Scan {
            path: path.to_string(),
            leaf: leaf.map(str::to_string),
            descendants: descendants
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("a/b/"), "/a/b");
        assert_eq!(normalize("/"), "/");
        assert_eq!(normalize(""), "/");
    }

    #[test]
    fn test_dir_prefix() {
        assert_eq!(dir_prefix("/a"), "/a/");
        assert_eq!(dir_prefix("/"), "/");
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("/a/b/c"), vec!["/a", "/a/b"]);
        assert!(ancestors("/a").is_empty());
        assert!(ancestors("/").is_empty());
    }

    #[test]
    fn test_subtree_of_leaf() {
        let s = scan("/r/name", Some("test"), &[]);
        assert_eq!(s.subtree().unwrap(), vec![(String::new(), "test".to_string())]);
    }

    #[test]
    fn test_subtree_skips_markers() {
        let s = scan("/r", None, &[("/r/", ""), ("/r/a/b", "1"), ("/r/c/", "")]);
        assert_eq!(s.subtree().unwrap(), vec![("a/b".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_subtree_of_empty_dir() {
        let s = scan("/r", None, &[("/r/", "")]);
        assert!(s.subtree().unwrap().is_empty());
        assert!(!s.has_children());
    }

    #[test]
    fn test_subtree_of_absent_path() {
        let s = scan("/r", None, &[]);
        assert!(s.is_absent());
        assert!(matches!(s.subtree(), Err(BackendError::NotFound { .. })));
    }

    #[test]
    fn test_listing() {
        let s = scan(
            "/r",
            None,
            &[("/r/", ""), ("/r/a/x", "1"), ("/r/a/y", "2"), ("/r/b", "3")],
        );
        assert_eq!(
            s.listing().unwrap(),
            Listing::Directory(vec!["a".to_string(), "b".to_string()])
        );
        assert!(s.has_children());
    }

    #[test]
    fn test_listing_of_root() {
        let s = scan("/", None, &[("/svc/a", "1")]);
        assert_eq!(s.listing().unwrap(), Listing::Directory(vec!["svc".to_string()]));
        assert_eq!(s.subtree().unwrap(), vec![("svc/a".to_string(), "1".to_string())]);
    }
}
