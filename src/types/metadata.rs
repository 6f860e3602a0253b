use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// Keys that identify a person and must never reach a log line.
/// Compared case-insensitively with `_` and `-` ignored.
pub const PII_KEYS: &[&str] = &["email", "password", "accesstoken", "refreshtoken"];

/// Caller supplied key/value pairs attached to an event, in insertion order.
#[derive(Clone, PartialEq, Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata(Map<String, Value>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Metadata::insert`].
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Serialize + fmt::Debug,
    {
        self.insert(key, value);
        self
    }

    /// Inserts a value, falling back to its `Debug` rendering when it cannot be
    /// represented as JSON (e.g. a map with non-string keys).
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Serialize + fmt::Debug,
    {
        let key = key.into();
        let value = serde_json::to_value(&value).unwrap_or_else(|e| {
            debug!(%key, error = %e, "Metadata value is not serializable, storing its debug form");
            Value::String(format!("{value:?}"))
        });
        self.0.insert(key, value);
    }

    pub fn insert_value<K: Into<String>>(&mut self, key: K, value: Value) {
        self.0.insert(key.into(), value);
    }

    /// Appends every entry of `other`; entries in `other` win on equal keys.
    pub fn extend(&mut self, other: Metadata) {
        self.0.extend(other.0);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
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

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.0
    }

    /// Drops every entry whose key names personal data, at any depth of nested
    /// objects and arrays. Returns how many were dropped.
    pub fn redact_pii(&mut self) -> usize {
        redact_map(&mut self.0)
    }
}

fn redact_map(map: &mut Map<String, Value>) -> usize {
    let before = map.len();
    map.retain(|key, _| !is_pii_key(key));
    let nested: usize = map.values_mut().map(redact_value).sum();
    before - map.len() + nested
}

fn redact_value(value: &mut Value) -> usize {
    match value {
        Value::Object(map) => redact_map(map),
        Value::Array(items) => items.iter_mut().map(redact_value).sum(),
        _ => 0,
    }
}

pub fn is_pii_key(key: &str) -> bool {
    let folded: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .map(|c| c.to_ascii_lowercase())
        .collect();
    PII_KEYS.contains(&folded.as_str())
}

impl From<Map<String, Value>> for Metadata {
    fn from(map: Map<String, Value>) -> Self {
        Metadata(map)
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Metadata(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl IntoIterator for Metadata {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn keeps_insertion_order() {
        let md = Metadata::new()
            .with("postId", 42)
            .with("slug", "hello-world")
            .with("commentCreated", true);
        let keys: Vec<&str> = md.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, vec!["postId", "slug", "commentCreated"]);
        assert_eq!(md.get("postId"), Some(&json!(42)));
    }

    #[test]
    fn unserializable_values_fall_back_to_debug() {
        let mut tuple_keyed = HashMap::new();
        tuple_keyed.insert((1, 2), "pair");
        let md = Metadata::new().with("grid", tuple_keyed);
        let rendered = md.get("grid").and_then(Value::as_str).unwrap();
        assert!(rendered.contains("(1, 2)"));
    }

    #[test]
    fn pii_keys_are_redacted() {
        let mut md = Metadata::new()
            .with("Email", "jane@example.com")
            .with("password", "hunter2")
            .with("access_token", "abc")
            .with("postId", 1);
        assert_eq!(md.redact_pii(), 3);
        assert_eq!(md.len(), 1);
        assert!(md.contains_key("postId"));
    }

    #[test]
    fn nested_pii_keys_are_redacted() {
        let mut md = Metadata::new()
            .with(
                "form",
                json!({"email": "jane@example.com", "password": "hunter2", "name": "Jane"}),
            )
            .with("sessions", json!([{"refreshToken": "r1", "device": "phone"}]));
        assert_eq!(md.redact_pii(), 3);
        assert_eq!(md.get("form"), Some(&json!({"name": "Jane"})));
        assert_eq!(md.get("sessions"), Some(&json!([{"device": "phone"}])));
    }
}
