// file: src/parser/canonical.rs
// description: folds raw yaml/toml/json parser output into value trees and canonical form
// reference: https://docs.rs/chrono

use crate::models::value::{CanonicalValue, FrontMatter};
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Timelike, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use yaml_rust::Yaml;

lazy_static! {
    // RFC 3339 instant with an explicit offset
    static ref INSTANT_PATTERN: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}[Tt ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:[Zz]|[+-]\d{2}:\d{2})$"
    ).expect("INSTANT_PATTERN regex is valid");

    static ref DATE_PATTERN: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}$"
    ).expect("DATE_PATTERN regex is valid");
}

/// Formats an instant the way the site generator does: second precision when
/// the sub-second part is zero, otherwise full precision with trailing zeros dropped.
pub fn format_instant(dt: &DateTime<Utc>) -> String {
    if dt.nanosecond() == 0 {
        return dt.to_rfc3339_opts(SecondsFormat::Secs, true);
    }
    let full = dt.to_rfc3339_opts(SecondsFormat::Nanos, true);
    let without_zone = full.trim_end_matches('Z').trim_end_matches('0');
    format!("{}Z", without_zone)
}

/// Recognizes strings that hold an instant or a bare calendar date.
///
/// Any string matching these shapes is treated as a date, even when it was
/// meant literally. A changed date-like string that resolves to the same
/// instant is therefore reported as unchanged.
pub fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if INSTANT_PATTERN.is_match(s) {
        let normalized = s.replacen(' ', "T", 1);
        return DateTime::parse_from_rfc3339(&normalized)
            .ok()
            .map(|dt| dt.with_timezone(&Utc));
    }
    if DATE_PATTERN.is_match(s) {
        return NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .ok()
            .and_then(|date| date.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc());
    }
    None
}

fn canonical_string(s: &str) -> CanonicalValue {
    match parse_timestamp(s) {
        Some(dt) => CanonicalValue::DateTime(dt),
        None => CanonicalValue::String(s.to_string()),
    }
}

/// Folds date-like strings into instants across a tree. Only comparison and
/// display normalization go through here; saved content keeps its strings. Idempotent.
pub fn canonicalize(value: &CanonicalValue) -> CanonicalValue {
    match value {
        CanonicalValue::String(s) => canonical_string(s),
        CanonicalValue::List(items) => CanonicalValue::List(items.iter().map(canonicalize).collect()),
        CanonicalValue::Map(map) => CanonicalValue::Map(canonicalize_map(map)),
        other => other.clone(),
    }
}

pub fn canonicalize_map(map: &FrontMatter) -> FrontMatter {
    map.iter()
        .map(|(k, v)| (k.clone(), canonicalize(v)))
        .collect()
}

pub fn from_yaml(value: &Yaml) -> CanonicalValue {
    match value {
        Yaml::Null | Yaml::BadValue | Yaml::Alias(_) => CanonicalValue::Null,
        Yaml::Boolean(b) => CanonicalValue::Bool(*b),
        Yaml::Integer(i) => CanonicalValue::Number(*i as f64),
        Yaml::Real(_) => value
            .as_f64()
            .map(CanonicalValue::Number)
            .unwrap_or(CanonicalValue::Null),
        Yaml::String(s) => CanonicalValue::String(s.clone()),
        Yaml::Array(items) => CanonicalValue::List(items.iter().map(from_yaml).collect()),
        Yaml::Hash(hash) => CanonicalValue::Map(
            hash.iter()
                .map(|(k, v)| (yaml_key(k), from_yaml(v)))
                .collect(),
        ),
    }
}

fn yaml_key(key: &Yaml) -> String {
    match key {
        Yaml::String(s) => s.clone(),
        Yaml::Real(s) => s.clone(),
        Yaml::Integer(i) => i.to_string(),
        Yaml::Boolean(b) => b.to_string(),
        Yaml::Null | Yaml::BadValue | Yaml::Alias(_) => "null".to_string(),
        other => from_yaml(other).to_plain_string(),
    }
}

pub fn from_toml(value: &toml::Value) -> CanonicalValue {
    match value {
        toml::Value::String(s) => CanonicalValue::String(s.clone()),
        toml::Value::Integer(i) => CanonicalValue::Number(*i as f64),
        toml::Value::Float(f) => CanonicalValue::Number(*f),
        toml::Value::Boolean(b) => CanonicalValue::Bool(*b),
        toml::Value::Datetime(dt) => toml_datetime(dt),
        toml::Value::Array(items) => CanonicalValue::List(items.iter().map(from_toml).collect()),
        toml::Value::Table(table) => CanonicalValue::Map(
            table
                .iter()
                .map(|(k, v)| (k.clone(), from_toml(v)))
                .collect(),
        ),
    }
}

/// Offset-less TOML datetimes are read as UTC; a bare local time stays text.
fn toml_datetime(dt: &toml::value::Datetime) -> CanonicalValue {
    let text = dt.to_string();
    if let Some(instant) = parse_timestamp(&text) {
        return CanonicalValue::DateTime(instant);
    }
    let local = text.replacen(' ', "T", 1);
    match NaiveDateTime::parse_from_str(&local, "%Y-%m-%dT%H:%M:%S%.f") {
        Ok(naive) => CanonicalValue::DateTime(naive.and_utc()),
        Err(_) => CanonicalValue::String(text),
    }
}

pub fn from_json(value: &serde_json::Value) -> CanonicalValue {
    match value {
        serde_json::Value::Null => CanonicalValue::Null,
        serde_json::Value::Bool(b) => CanonicalValue::Bool(*b),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(CanonicalValue::Number)
            .unwrap_or(CanonicalValue::Null),
        serde_json::Value::String(s) => CanonicalValue::String(s.clone()),
        serde_json::Value::Array(items) => {
            CanonicalValue::List(items.iter().map(from_json).collect())
        }
        serde_json::Value::Object(map) => CanonicalValue::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), from_json(v)))
                .collect(),
        ),
    }
}
