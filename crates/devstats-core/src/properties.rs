//! Typed property bags for catalog entities.
//!
//! Catalog properties are an open key/value mapping. Values written by this
//! crate are always one of the closed kinds below; values of any other JSON
//! shape that already exist on an entity are carried as [`PropertyValue::Opaque`]
//! so a write never loses them.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type PropertyMap = BTreeMap<String, PropertyValue>;

/// Relations are never interpreted, only passed back unchanged.
pub type Relations = serde_json::Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum PropertyValue {
    String(String),
    Number(serde_json::Number),
    Timestamp(DateTime<Utc>),
    Boolean(bool),
    Opaque(Value),
}

impl From<Value> for PropertyValue {
    // Strings are kept verbatim; only values this crate produces become
    // timestamps, so existing properties round-trip byte for byte.
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => PropertyValue::String(s),
            Value::Number(n) => PropertyValue::Number(n),
            Value::Bool(b) => PropertyValue::Boolean(b),
            other => PropertyValue::Opaque(other),
        }
    }
}

impl From<PropertyValue> for Value {
    fn from(value: PropertyValue) -> Self {
        match value {
            PropertyValue::String(s) => Value::String(s),
            PropertyValue::Number(n) => Value::Number(n),
            PropertyValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
            }
            PropertyValue::Boolean(b) => Value::Bool(b),
            PropertyValue::Opaque(v) => v,
        }
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(value: DateTime<Utc>) -> Self {
        PropertyValue::Timestamp(value)
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::String(value.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::String(value)
    }
}

impl From<bool> for PropertyValue {
    fn from(value: bool) -> Self {
        PropertyValue::Boolean(value)
    }
}

impl From<i64> for PropertyValue {
    fn from(value: i64) -> Self {
        PropertyValue::Number(value.into())
    }
}

/// Overlay `fragment` on top of `existing`. Keys present in both take the
/// fragment's value; every other key survives unchanged.
pub fn merge_properties(existing: &PropertyMap, fragment: PropertyMap) -> PropertyMap {
    let mut merged = existing.clone();
    merged.extend(fragment);
    merged
}
