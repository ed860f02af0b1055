//! Tag sets
//!
//! A `TagSet` is a key/value mapping of user-managed tags. `from_raw_map`
//! and `from_remote` drop reserved keys; `From`, `FromIterator` and `insert`
//! do not, so the reconciler filters again before it talks to a store.
//! Sets are built fresh from desired-state input or a store response right
//! before they are used.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tagsync_store::TagMap;

use crate::filter::TagFilter;

/// Error building a tag set from raw input
#[derive(Debug, thiserror::Error)]
pub enum TagSetError {
    #[error("Tag '{key}' has a {found} value; tag values must be strings")]
    InvalidTagValue { key: String, found: &'static str },

    #[error("Tags must be a JSON object, found {found}")]
    NotAnObject { found: &'static str },
}

/// Mapping from tag key to tag value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagSet(TagMap);

impl TagSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a tag set from an untyped mapping, such as a desired-state record.
    ///
    /// Reserved keys are dropped before values are checked. Any remaining
    /// value that is not a JSON string is rejected rather than coerced.
    pub fn from_raw_map(raw: &Map<String, Value>, filter: &TagFilter) -> Result<Self, TagSetError> {
        let mut tags = TagMap::new();
        for (key, value) in raw {
            if filter.is_ignored(key) {
                continue;
            }
            match value {
                Value::String(s) => {
                    tags.insert(key.clone(), s.clone());
                }
                other => {
                    return Err(TagSetError::InvalidTagValue {
                        key: key.clone(),
                        found: json_type_name(other),
                    });
                }
            }
        }
        Ok(Self(tags))
    }

    /// Build a tag set from tags reported by a store, dropping reserved keys
    pub fn from_remote(tags: TagMap, filter: &TagFilter) -> Self {
        Self(tags.into_iter().filter(|(k, _)| !filter.is_ignored(k)).collect())
    }

    /// Copy of this set with reserved keys removed
    pub fn without_reserved(&self, filter: &TagFilter) -> Self {
        Self(
            self.0
                .iter()
                .filter(|(k, _)| !filter.is_ignored(k))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
        self.0.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.0.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn as_map(&self) -> &TagMap {
        &self.0
    }

    pub fn into_inner(self) -> TagMap {
        self.0
    }
}

impl From<TagMap> for TagSet {
    fn from(map: TagMap) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for TagSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect::<BTreeMap<_, _>>(),
        )
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
