// src/bundle.rs
use crate::utils::error::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Namespace every locale carries regardless of the current route.
pub const DEFAULT_NAMESPACE: &str = "default";

/// Flattened translation key to translated string, scoped to one locale.
pub type MessageTable = HashMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BundleKey {
    pub locale: String,
    pub namespace: String,
}

impl BundleKey {
    /// An empty namespace addresses the default bundle.
    pub fn new(locale: impl Into<String>, namespace: impl Into<String>) -> Self {
        let namespace = namespace.into();
        BundleKey {
            locale: locale.into(),
            namespace: if namespace.trim().is_empty() {
                DEFAULT_NAMESPACE.to_string()
            } else {
                namespace
            },
        }
    }
}

impl fmt::Display for BundleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.locale, self.namespace)
    }
}

/// Decodes a JSON bundle document into a flat table.
///
/// Nested objects become dotted keys and array items are addressed by index.
/// Numbers and booleans keep their JSON text, `null` leaves are dropped.
pub fn parse_bundle(key: &BundleKey, bytes: &[u8]) -> Result<MessageTable, Error> {
    let document: Value = serde_json::from_slice(bytes).map_err(|e| Error::BundleDecode {
        key: key.to_string(),
        reason: e.to_string(),
    })?;
    table_from_value(key, document)
}

pub fn table_from_value(key: &BundleKey, document: Value) -> Result<MessageTable, Error> {
    match document {
        Value::Object(map) => {
            let mut table = MessageTable::new();
            for (k, v) in map {
                flatten_into(&mut table, k, v);
            }
            Ok(table)
        }
        other => Err(Error::BundleDecode {
            key: key.to_string(),
            reason: format!("expected a JSON object at the root, found {}", json_kind(&other)),
        }),
    }
}

fn flatten_into(table: &mut MessageTable, prefix: String, value: Value) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            table.insert(prefix, s);
        }
        Value::Bool(_) | Value::Number(_) => {
            table.insert(prefix, value.to_string());
        }
        Value::Array(items) => {
            for (i, item) in items.into_iter().enumerate() {
                flatten_into(table, format!("{}.{}", prefix, i), item);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                flatten_into(table, format!("{}.{}", prefix, k), v);
            }
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
