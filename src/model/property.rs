//! Property values carried by installed resources and templates.
//!
//! Resources of every kind are compared through the same tagged value type,
//! so the comparator never has to inspect a resource for which fields it
//! happens to carry.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Ordered mapping of property name to value.
pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// A single comparable property value.
///
/// Deserialized untagged so snapshot files can use plain JSON/YAML values.
/// Variants are tried in declaration order; anything that is not a scalar
/// or a list of labels lands in [`PropertyValue::Structured`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    /// Absent value.
    #[default]
    Null,
    /// Boolean flag (e.g. `enabled`).
    Bool(bool),
    /// Integer value (e.g. `trigger_threshold`).
    Integer(i64),
    /// Any other number (fractions, integers beyond `i64`).
    Number(serde_json::Number),
    /// Free text (e.g. `query`, `severity`, ISO-8601 durations).
    Text(String),
    /// List of labels (e.g. `tactics`, `techniques`).
    List(Vec<String>),
    /// Nested or mixed content (e.g. `entity_mappings`), compared exactly.
    Structured(serde_json::Value),
}

impl PropertyValue {
    /// Returns true if this is the absent value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the text content, if this is a text value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the list items, or an empty slice for anything else.
    #[must_use]
    pub fn as_list(&self) -> &[String] {
        match self {
            Self::List(items) => items,
            _ => &[],
        }
    }

    /// Compares two values for change detection.
    ///
    /// Lists compare as sets: order and duplicates are ignored. Everything
    /// else compares exactly, and `Null` only equals `Null`.
    #[must_use]
    pub fn equivalent(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(a), Self::List(b)) => {
                let a: BTreeSet<&str> = a.iter().map(String::as_str).collect();
                let b: BTreeSet<&str> = b.iter().map(String::as_str).collect();
                a == b
            }
            _ => self == other,
        }
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(value: Vec<String>) -> Self {
        Self::List(value)
    }
}

impl From<&[&str]> for PropertyValue {
    fn from(value: &[&str]) -> Self {
        Self::List(value.iter().map(|s| (*s).to_string()).collect())
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "(none)"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
            Self::List(items) => write!(f, "{}", items.join(", ")),
            Self::Structured(value) => write!(f, "{value}"),
        }
    }
}
