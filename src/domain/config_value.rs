// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration value tree.
//!
//! Every value held by the backend is an opaque string. A [`ConfigValue`] is
//! either one of those strings or an ordered composite of named children.
//! Whether a composite reads as a list or a map is decided by its keys, never
//! stored: see [`ConfigMap::is_list`].

use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A node of the configuration tree.
///
/// # Examples
///
/// ```
/// use etcdcfg::domain::{ConfigMap, ConfigValue};
///
/// let mut map = ConfigMap::new();
/// map.insert("host", ConfigValue::from("localhost"));
/// let value = ConfigValue::Composite(map);
///
/// assert_eq!(value.get("host").and_then(|v| v.as_scalar()), Some("localhost"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigValue {
    /// A leaf value.
    Scalar(String),
    /// A directory of named children.
    Composite(ConfigMap),
}

impl ConfigValue {
    /// Creates an empty composite.
    pub fn empty() -> Self {
        ConfigValue::Composite(ConfigMap::new())
    }

    /// Builds a list-like composite keyed `0..n` from the given items.
    ///
    /// ```
    /// use etcdcfg::domain::ConfigValue;
    ///
    /// let list = ConfigValue::list(["Zero", "One"]);
    /// assert!(list.is_list());
    /// assert_eq!(list.get("1"), Some(&ConfigValue::from("One")));
    /// ```
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ConfigValue>,
    {
        ConfigValue::Composite(
            items
                .into_iter()
                .enumerate()
                .map(|(i, v)| (i.to_string(), v.into()))
                .collect(),
        )
    }

    /// Returns the scalar string, if this is a leaf.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(s) => Some(s),
            ConfigValue::Composite(_) => None,
        }
    }

    /// Returns the children, if this is a composite.
    pub fn as_composite(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Scalar(_) => None,
            ConfigValue::Composite(map) => Some(map),
        }
    }

    /// Returns true for a leaf.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ConfigValue::Scalar(_))
    }

    /// Returns true for a composite whose keys are `0..n` in order.
    pub fn is_list(&self) -> bool {
        self.as_composite().is_some_and(ConfigMap::is_list)
    }

    /// Looks up a direct child by key. Scalars have no children.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.as_composite().and_then(|map| map.get(key))
    }

    /// Walks down the tree one segment at a time.
    pub fn lookup<S: AsRef<str>>(&self, segments: &[S]) -> Option<&ConfigValue> {
        segments
            .iter()
            .try_fold(self, |node, segment| node.get(segment.as_ref()))
    }

    /// Puts `value` at `segments`, creating intermediate composites.
    ///
    /// A scalar found on the way down is replaced by a composite. Whatever
    /// was at `segments` before is replaced as a whole.
    pub fn set_at<S: AsRef<str>>(&mut self, segments: &[S], value: ConfigValue) {
        let Some((first, rest)) = segments.split_first() else {
            *self = value;
            return;
        };
        if self.is_scalar() {
            *self = ConfigValue::empty();
        }
        if let ConfigValue::Composite(map) = self {
            map.entry(first.as_ref()).set_at(rest, value);
        }
    }

    /// Removes the node at `segments`, returning it.
    pub fn remove_at<S: AsRef<str>>(&mut self, segments: &[S]) -> Option<ConfigValue> {
        let (last, parents) = segments.split_last()?;
        let mut node = self;
        for segment in parents {
            node = match node {
                ConfigValue::Composite(map) => map.get_mut(segment.as_ref())?,
                ConfigValue::Scalar(_) => return None,
            };
        }
        match node {
            ConfigValue::Composite(map) => map.remove(last.as_ref()),
            ConfigValue::Scalar(_) => None,
        }
    }

    /// Parses a YAML document into a value.
    ///
    /// Numbers, booleans and nulls become their string form; sequences become
    /// list-like composites.
    #[cfg(feature = "yaml")]
    pub fn from_yaml_str(content: &str) -> crate::domain::Result<Self> {
        serde_yaml::from_str(content).map_err(|e| crate::domain::ConfigError::Settings {
            message: format!("Failed to parse YAML value: {}", e),
        })
    }

    /// Renders this value as a YAML document.
    #[cfg(feature = "yaml")]
    pub fn to_yaml_string(&self) -> crate::domain::Result<String> {
        serde_yaml::to_string(self).map_err(|e| crate::domain::ConfigError::Settings {
            message: format!("Failed to render YAML value: {}", e),
        })
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::Scalar(s)
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::Scalar(s.to_string())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Composite(map)
    }
}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigValue {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        ConfigValue::Composite(iter.into_iter().collect())
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigValue::Scalar(s) => write!(f, "{}", s),
            ConfigValue::Composite(map) => {
                let json = serde_json::to_string(map).map_err(|_| fmt::Error)?;
                write!(f, "{}", json)
            }
        }
    }
}

/// Ordered mapping from key to child value.
///
/// Keys keep the order in which they were inserted, which for a loaded tree is
/// the order the backend listed them in. Equality ignores that order: two maps
/// are equal when they hold the same keys with equal values.
#[derive(Clone, Debug, Default)]
pub struct ConfigMap {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of children.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when there are no children.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up a child.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Looks up a child mutably.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// True if `key` is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Inserts or replaces a child, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) -> Option<ConfigValue> {
        let key = key.into();
        match self.get_mut(&key) {
            Some(slot) => Some(std::mem::replace(slot, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Removes a child.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    /// Returns the child at `key`, inserting an empty composite if absent.
    pub fn entry(&mut self, key: &str) -> &mut ConfigValue {
        let index = match self.entries.iter().position(|(k, _)| k == key) {
            Some(index) => index,
            None => {
                self.entries.push((key.to_string(), ConfigValue::empty()));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index].1
    }

    /// Iterates over children in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Iterates over keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    /// True when the keys are exactly `"0"`, `"1"`, ... in order.
    ///
    /// Trees built from the backend always re-index list-like directories
    /// this way, so this is how a loaded composite reads as a list. An empty
    /// map is not a list.
    pub fn is_list(&self) -> bool {
        !self.entries.is_empty()
            && self
                .entries
                .iter()
                .enumerate()
                .all(|(i, (k, _))| *k == i.to_string())
    }
}

impl PartialEq for ConfigMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl Eq for ConfigMap {}

impl<K: Into<String>, V: Into<ConfigValue>> FromIterator<(K, V)> for ConfigMap {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = ConfigMap::new();
        for (k, v) in iter {
            map.insert(k, v.into());
        }
        map
    }
}

impl IntoIterator for ConfigMap {
    type Item = (String, ConfigValue);
    type IntoIter = std::vec::IntoIter<(String, ConfigValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ConfigValue::Scalar(s) => serializer.serialize_str(s),
            ConfigValue::Composite(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for ConfigMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if self.is_list() {
            let mut seq = serializer.serialize_seq(Some(self.len()))?;
            for (_, value) in self.iter() {
                seq.serialize_element(value)?;
            }
            seq.end()
        } else {
            let mut map = serializer.serialize_map(Some(self.len()))?;
            for (key, value) in self.iter() {
                map.serialize_entry(key, value)?;
            }
            map.end()
        }
    }
}

struct ConfigValueVisitor;

impl<'de> Visitor<'de> for ConfigValueVisitor {
    type Value = ConfigValue;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a scalar, a sequence or a mapping")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<ConfigValue, E> {
        Ok(ConfigValue::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<ConfigValue, E> {
        Ok(ConfigValue::Scalar(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<ConfigValue, E> {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<ConfigValue, E> {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<ConfigValue, E> {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<ConfigValue, E> {
        Ok(ConfigValue::Scalar(v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<ConfigValue, E> {
        Ok(ConfigValue::Scalar(String::new()))
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<ConfigValue, E> {
        self.visit_unit()
    }

    fn visit_some<D: Deserializer<'de>>(self, d: D) -> std::result::Result<ConfigValue, D::Error> {
        ConfigValue::deserialize(d)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<ConfigValue, A::Error> {
        let mut map = ConfigMap::new();
        while let Some(item) = seq.next_element::<ConfigValue>()? {
            map.insert(map.len().to_string(), item);
        }
        Ok(ConfigValue::Composite(map))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<ConfigValue, A::Error> {
        let mut map = ConfigMap::new();
        while let Some((key, value)) = access.next_entry::<ScalarKey, ConfigValue>()? {
            map.insert(key.0, value);
        }
        Ok(ConfigValue::Composite(map))
    }
}

impl<'de> Deserialize<'de> for ConfigValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_any(ConfigValueVisitor)
    }
}

/// Map key that also accepts YAML's integer and boolean keys.
struct ScalarKey(String);

impl<'de> Deserialize<'de> for ScalarKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        match ConfigValue::deserialize(deserializer)? {
            ConfigValue::Scalar(s) => Ok(ScalarKey(s)),
            ConfigValue::Composite(_) => Err(de::Error::custom("mapping keys must be scalars")),
        }
    }
}
