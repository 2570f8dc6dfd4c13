// file: src/models/value.rs
// description: canonical front matter value tree used for all comparisons
// reference: https://docs.rs/serde_json

use crate::parser::canonical::{format_instant, from_json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;

/// Front matter mapping. Keys are kept sorted so insertion order never affects equality.
pub type FrontMatter = BTreeMap<String, CanonicalValue>;

/// Front matter value.
///
/// Numbers are always `f64` so `5` and `5.0` compare equal, and instants are
/// always UTC. Equality is structural: a `DateTime` never equals a `String`
/// holding the same instant, and `NaN` never equals itself. Semantic
/// comparison goes through `to_canonical_json` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum CanonicalValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    DateTime(DateTime<Utc>),
    List(Vec<CanonicalValue>),
    Map(FrontMatter),
}

impl CanonicalValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            CanonicalValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&FrontMatter> {
        match self {
            CanonicalValue::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[CanonicalValue]> {
        match self {
            CanonicalValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Plain-text rendering used when a value has to become a map key or a path segment.
    pub fn to_plain_string(&self) -> String {
        match self {
            CanonicalValue::Null => "null".to_string(),
            CanonicalValue::Bool(b) => b.to_string(),
            CanonicalValue::Number(n) => format_number(*n),
            CanonicalValue::String(s) => s.clone(),
            CanonicalValue::DateTime(dt) => format_instant(dt),
            CanonicalValue::List(_) | CanonicalValue::Map(_) => {
                self.to_canonical_json().to_string()
            }
        }
    }

    /// JSON form of the tree. Integral numbers are emitted as integers and
    /// instants as their canonical string, so the encoding is deterministic.
    pub fn to_canonical_json(&self) -> serde_json::Value {
        match self {
            CanonicalValue::Null => serde_json::Value::Null,
            CanonicalValue::Bool(b) => serde_json::Value::Bool(*b),
            CanonicalValue::Number(n) => number_to_json(*n),
            CanonicalValue::String(s) => serde_json::Value::String(s.clone()),
            CanonicalValue::DateTime(dt) => serde_json::Value::String(format_instant(dt)),
            CanonicalValue::List(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_canonical_json).collect())
            }
            CanonicalValue::Map(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_canonical_json()))
                    .collect(),
            ),
        }
    }
}

/// Canonical JSON encoding of a whole front matter mapping.
pub fn front_matter_to_json(front_matter: &FrontMatter) -> serde_json::Value {
    serde_json::Value::Object(
        front_matter
            .iter()
            .map(|(k, v)| (k.clone(), v.to_canonical_json()))
            .collect(),
    )
}

/// Returns the integer form of `n` when it round-trips exactly through `i64`.
pub(crate) fn integral_value(n: f64) -> Option<i64> {
    const MAX_EXACT: f64 = 9_007_199_254_740_992.0;
    if n.is_finite() && n.fract() == 0.0 && n.abs() <= MAX_EXACT {
        Some(n as i64)
    } else {
        None
    }
}

fn number_to_json(n: f64) -> serde_json::Value {
    match integral_value(n) {
        Some(i) => serde_json::Value::from(i),
        None => serde_json::Number::from_f64(n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
    }
}

fn format_number(n: f64) -> String {
    match integral_value(n) {
        Some(i) => i.to_string(),
        None => n.to_string(),
    }
}

impl From<&str> for CanonicalValue {
    fn from(value: &str) -> Self {
        CanonicalValue::String(value.to_string())
    }
}

impl From<String> for CanonicalValue {
    fn from(value: String) -> Self {
        CanonicalValue::String(value)
    }
}

impl From<bool> for CanonicalValue {
    fn from(value: bool) -> Self {
        CanonicalValue::Bool(value)
    }
}

impl From<f64> for CanonicalValue {
    fn from(value: f64) -> Self {
        CanonicalValue::Number(value)
    }
}

impl From<i64> for CanonicalValue {
    fn from(value: i64) -> Self {
        CanonicalValue::Number(value as f64)
    }
}

impl Serialize for CanonicalValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_canonical_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CanonicalValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(|value| from_json(&value))
    }
}
