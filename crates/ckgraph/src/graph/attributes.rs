//! Open attribute maps carried by nodes and edges.
//!
//! Keys are kept ordered so that serialized graphs are byte-stable across runs.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Attribute value stored on a node or edge.
///
/// Serialized untagged, so a JSON document reads `"is_async": true` rather
/// than a wrapped variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Explicit null/absence of value
    Null,
    /// Boolean flag (is_async, is_external)
    Bool(bool),
    /// Integer value (line numbers, counts)
    Int(i64),
    /// String value (methods, tags, urls)
    String(String),
    /// List of strings (pseudo states, imported names)
    StringList(Vec<String>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => f.write_str("null"),
            AttributeValue::Bool(b) => write!(f, "{b}"),
            AttributeValue::Int(i) => write!(f, "{i}"),
            AttributeValue::String(s) => f.write_str(s),
            AttributeValue::StringList(list) => write!(f, "[{}]", list.join(", ")),
        }
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        AttributeValue::String(value)
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        AttributeValue::String(value.to_string())
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        AttributeValue::Int(value)
    }
}

impl From<usize> for AttributeValue {
    fn from(value: usize) -> Self {
        AttributeValue::Int(i64::try_from(value).unwrap_or(i64::MAX))
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        AttributeValue::Bool(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(value: Vec<String>) -> Self {
        AttributeValue::StringList(value)
    }
}

/// Ordered key-value metadata for nodes and edges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AttributeMap {
    data: BTreeMap<String, AttributeValue>,
}

impl AttributeMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder pattern: add an attribute and return self.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttributeValue>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.data.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.data.iter()
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        match self.data.get(key) {
            Some(AttributeValue::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        match self.data.get(key) {
            Some(AttributeValue::Int(i)) => Some(*i),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.data.get(key) {
            Some(AttributeValue::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn get_string_list(&self, key: &str) -> Option<&[String]> {
        match self.data.get(key) {
            Some(AttributeValue::StringList(list)) => Some(list),
            _ => None,
        }
    }

    /// Append `value` to a string-list attribute, creating it if absent.
    ///
    /// Values already present are not repeated.
    pub fn push_unique(&mut self, key: &str, value: impl Into<String>) {
        let value = value.into();
        match self.data.get_mut(key) {
            Some(AttributeValue::StringList(list)) => {
                if !list.contains(&value) {
                    list.push(value);
                }
            }
            _ => {
                self.data
                    .insert(key.to_string(), AttributeValue::StringList(vec![value]));
            }
        }
    }

    /// Union `other` into `self`.
    ///
    /// Absent keys are copied, string lists are unioned in order, and scalar
    /// disagreements keep the value already present. Each discarded value is
    /// returned as `(key, kept, discarded)`.
    pub fn union_from(&mut self, other: &AttributeMap) -> Vec<(String, AttributeValue, AttributeValue)> {
        let mut conflicts = Vec::new();
        for (key, incoming) in &other.data {
            match self.data.get_mut(key) {
                None => {
                    self.data.insert(key.clone(), incoming.clone());
                }
                Some(AttributeValue::StringList(existing)) => {
                    if let AttributeValue::StringList(extra) = incoming {
                        for item in extra {
                            if !existing.contains(item) {
                                existing.push(item.clone());
                            }
                        }
                    } else {
                        conflicts.push((
                            key.clone(),
                            AttributeValue::StringList(existing.clone()),
                            incoming.clone(),
                        ));
                    }
                }
                Some(existing) => {
                    if existing != incoming {
                        conflicts.push((key.clone(), existing.clone(), incoming.clone()));
                    }
                }
            }
        }
        conflicts
    }
}

impl FromIterator<(String, AttributeValue)> for AttributeMap {
    fn from_iter<T: IntoIterator<Item = (String, AttributeValue)>>(iter: T) -> Self {
        Self {
            data: BTreeMap::from_iter(iter),
        }
    }
}
