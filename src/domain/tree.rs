// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversion between nested values and flat backend entries.
//!
//! [`flatten`] turns a value into the leaf writes that store it, and [`build`]
//! turns the leaves returned by a subtree query back into a value.
//!
//! Directories whose children are all non-negative integers are read back as
//! lists: children are ordered by their number and re-indexed from zero.
//! Gaps are dropped, not filled, so `{1: a, 2: b}` builds to `[a, b]`. Callers
//! that need positional stability must store contiguous indices.

use crate::domain::config_value::{ConfigMap, ConfigValue};
use crate::domain::errors::Result;
use crate::domain::path::{PathCodec, BACKEND_SEPARATOR};

/// A single leaf write: an absolute backend key and its scalar value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FlatEntry {
    /// Absolute backend key
    pub path: String,
    /// Scalar value stored at `path`
    pub value: String,
}

impl FlatEntry {
    /// Creates a new entry.
    pub fn new(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }
}

/// Decomposes `value` into the leaf writes that store it under `base`.
///
/// Entries come out depth first in the value's iteration order, which is the
/// order they are written in. An empty composite produces no entries.
///
/// # Examples
///
/// ```
/// use etcdcfg::domain::tree::{flatten, FlatEntry};
/// use etcdcfg::domain::ConfigValue;
///
/// let value: ConfigValue = [("one", "1"), ("two", "2")].into_iter().collect();
/// let entries = flatten("/svc/array", &value).unwrap();
/// assert_eq!(entries, vec![
///     FlatEntry::new("/svc/array/one", "1"),
///     FlatEntry::new("/svc/array/two", "2"),
/// ]);
/// ```
pub fn flatten(base: &str, value: &ConfigValue) -> Result<Vec<FlatEntry>> {
    let mut entries = Vec::new();
    flatten_into(base, value, &mut entries)?;
    Ok(entries)
}

fn flatten_into(base: &str, value: &ConfigValue, entries: &mut Vec<FlatEntry>) -> Result<()> {
    match value {
        ConfigValue::Scalar(s) => entries.push(FlatEntry::new(base, s.as_str())),
        ConfigValue::Composite(map) => {
            for (key, child) in map.iter() {
                flatten_into(&PathCodec::join(base, key)?, child, entries)?;
            }
        }
    }
    Ok(())
}

/// Prefix tree of relative paths.
enum Trie {
    Leaf(String),
    Branch(Vec<(String, Trie)>),
}

impl Trie {
    fn insert(&mut self, segments: &[&str], value: &str) {
        let Some((first, rest)) = segments.split_first() else {
            if let Trie::Branch(children) = self {
                if !children.is_empty() {
                    tracing::warn!("Dropping leaf that shadows a directory");
                    return;
                }
            }
            *self = Trie::Leaf(value.to_string());
            return;
        };
        if let Trie::Leaf(_) = self {
            tracing::warn!("Replacing leaf with directory '{}'", first);
            *self = Trie::Branch(Vec::new());
        }
        if let Trie::Branch(children) = self {
            let index = match children.iter().position(|(k, _)| k == first) {
                Some(index) => index,
                None => {
                    children.push((first.to_string(), Trie::Branch(Vec::new())));
                    children.len() - 1
                }
            };
            children[index].1.insert(rest, value);
        }
    }

    fn into_value(self) -> ConfigValue {
        match self {
            Trie::Leaf(value) => ConfigValue::Scalar(value),
            Trie::Branch(children) => ConfigValue::Composite(classify(children)),
        }
    }
}

/// Parses a canonical non-negative integer key (`"0"`, `"12"`, not `"012"`).
fn list_index(key: &str) -> Option<u64> {
    key.parse::<u64>()
        .ok()
        .filter(|n| n.to_string() == key)
}

fn classify(children: Vec<(String, Trie)>) -> ConfigMap {
    let indices: Option<Vec<u64>> = children.iter().map(|(k, _)| list_index(k)).collect();
    match indices {
        Some(indices) if !children.is_empty() => {
            let mut numbered: Vec<(u64, Trie)> = indices
                .into_iter()
                .zip(children)
                .map(|(n, (_, node))| (n, node))
                .collect();
            numbered.sort_by_key(|(n, _)| *n);
            numbered
                .into_iter()
                .enumerate()
                .map(|(i, (_, node))| (i.to_string(), node.into_value()))
                .collect()
        }
        _ => children
            .into_iter()
            .map(|(key, node)| (key, node.into_value()))
            .collect(),
    }
}

/// Reconstructs a value from the entries of a subtree query.
///
/// `entries` maps paths relative to the queried node to scalar values, in the
/// order the backend listed them. `queried_segment` is the final segment of
/// the queried path, if any.
///
/// When the query returned exactly one entry whose relative path is empty or
/// equal to `queried_segment`, the queried node is itself a leaf and its
/// scalar is returned directly.
///
/// # Examples
///
/// ```
/// use etcdcfg::domain::tree::build;
/// use etcdcfg::domain::ConfigValue;
///
/// let entries = vec![
///     ("1".to_string(), "One".to_string()),
///     ("2".to_string(), "Two".to_string()),
/// ];
/// assert_eq!(build(&entries, None), ConfigValue::list(["One", "Two"]));
///
/// let leaf = vec![(String::new(), "test".to_string())];
/// assert_eq!(build(&leaf, Some("name")), ConfigValue::from("test"));
/// ```
pub fn build(entries: &[(String, String)], queried_segment: Option<&str>) -> ConfigValue {
    if let [(key, value)] = entries {
        if key.is_empty() || Some(key.as_str()) == queried_segment {
            return ConfigValue::Scalar(value.clone());
        }
    }

    let mut root = Trie::Branch(Vec::new());
    for (key, value) in entries {
        let segments: Vec<&str> = key
            .split(BACKEND_SEPARATOR)
            .filter(|s| !s.is_empty())
            .collect();
        root.insert(&segments, value);
    }
    root.into_value()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_build_nested_map() {
        let value = build(
            &entries(&[
                ("nodeOne/nodeA", "A"),
                ("nodeOne/nodeB", "B"),
                ("nodeOne/nodeC/subNode", "3rd"),
                ("nodeTwo", "Two"),
            ]),
            None,
        );
        let expected: ConfigValue = [
            (
                "nodeOne",
                [
                    ("nodeA", ConfigValue::from("A")),
                    ("nodeB", ConfigValue::from("B")),
                    ("nodeC", [("subNode", "3rd")].into_iter().collect()),
                ]
                .into_iter()
                .collect(),
            ),
            ("nodeTwo", ConfigValue::from("Two")),
        ]
        .into_iter()
        .collect();
        assert_eq!(value, expected);
    }

    #[test]
    fn test_build_list_is_sorted_numerically() {
        let value = build(
            &entries(&[("10", "ten"), ("2", "two"), ("0", "zero")]),
            None,
        );
        assert_eq!(value, ConfigValue::list(["zero", "two", "ten"]));
        let keys: Vec<&str> = value.as_composite().unwrap().keys().collect();
        assert_eq!(keys, vec!["0", "1", "2"]);
    }

    #[test]
    fn test_build_partial_list_drops_gaps() {
        let value = build(&entries(&[("1", "One"), ("2", "Two")]), None);
        assert_eq!(value, ConfigValue::list(["One", "Two"]));
    }

    #[test]
    fn test_build_mixed_keys_is_map() {
        let value = build(&entries(&[("0", "zero"), ("name", "n")]), None);
        assert!(!value.is_list());
        assert_eq!(value.get("0"), Some(&ConfigValue::from("zero")));
        assert_eq!(value.get("name"), Some(&ConfigValue::from("n")));
    }

    #[test]
    fn test_build_non_canonical_number_is_map() {
        let value = build(&entries(&[("01", "a"), ("1", "b")]), None);
        assert!(!value.is_list());
        assert!(value.get("01").is_some());
    }

    #[test]
    fn test_build_nested_list_inside_map() {
        let value = build(
            &entries(&[("test", "test"), ("subNode/0", "00"), ("subNode/1", "11")]),
            None,
        );
        assert_eq!(value.get("subNode"), Some(&ConfigValue::list(["00", "11"])));
    }

    #[test]
    fn test_build_collapses_empty_key() {
        let value = build(&entries(&[("", "value")]), Some("levelTwo"));
        assert_eq!(value, ConfigValue::from("value"));
    }

    #[test]
    fn test_build_collapses_queried_segment() {
        let value = build(&entries(&[("name", "test")]), Some("name"));
        assert_eq!(value, ConfigValue::from("test"));
    }

    #[test]
    fn test_build_single_other_child_does_not_collapse() {
        let value = build(&entries(&[("child", "test")]), Some("name"));
        assert_eq!(value, [("child", "test")].into_iter().collect());
    }

    #[test]
    fn test_build_empty_is_empty_map() {
        assert_eq!(build(&[], None), ConfigValue::empty());
    }

    #[test]
    fn test_flatten_scalar() {
        let entries = flatten("/root/name", &ConfigValue::from("test")).unwrap();
        assert_eq!(entries, vec![FlatEntry::new("/root/name", "test")]);
    }

    #[test]
    fn test_flatten_nested_depth_first() {
        let value: ConfigValue = [
            ("a", ConfigValue::list(["x", "y"])),
            ("b", ConfigValue::from("z")),
        ]
        .into_iter()
        .collect();
        let entries = flatten("/r", &value).unwrap();
        assert_eq!(
            entries,
            vec![
                FlatEntry::new("/r/a/0", "x"),
                FlatEntry::new("/r/a/1", "y"),
                FlatEntry::new("/r/b", "z"),
            ]
        );
    }

    #[test]
    fn test_flatten_empty_composite() {
        assert!(flatten("/r", &ConfigValue::empty()).unwrap().is_empty());
    }

    #[test]
    fn test_flatten_rejects_slash_in_key() {
        let value: ConfigValue = [("a/b", "x")].into_iter().collect();
        assert!(flatten("/r", &value).is_err());
    }
}
