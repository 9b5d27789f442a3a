//! Structured key-value metadata attached to log records

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Arbitrary key-value mapping carried alongside a log message
///
/// Values are plain JSON so that metadata received by the API layer can be
/// forwarded unchanged.
///
/// # Example
///
/// ```
/// use relay_logger_pool::LogMetadata;
///
/// let metadata = LogMetadata::new()
///     .with_field("file_id", "a1b2c3")
///     .with_field("size", 2048)
///     .with_field("cached", false);
///
/// assert_eq!(metadata.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LogMetadata {
    fields: BTreeMap<String, Value>,
}

impl LogMetadata {
    pub fn new() -> Self {
        Self {
            fields: BTreeMap::new(),
        }
    }

    /// Add a field (builder version)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field (mutable version)
    pub fn add_field<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<Value>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, Value> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Format fields as key=value pairs
    pub fn format_fields(&self) -> String {
        self.fields
            .iter()
            .map(|(k, v)| match v {
                Value::String(s) => format!("{}={}", k, s),
                other => format!("{}={}", k, other),
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Pretty JSON rendering, used for relay messages
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.fields)
    }
}

impl fmt::Display for LogMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_fields())
    }
}

impl From<serde_json::Map<String, Value>> for LogMetadata {
    fn from(map: serde_json::Map<String, Value>) -> Self {
        Self {
            fields: map.into_iter().collect(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for LogMetadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_metadata_creation() {
        let metadata = LogMetadata::new();
        assert!(metadata.is_empty());
    }

    #[test]
    fn test_metadata_with_fields() {
        let metadata = LogMetadata::new()
            .with_field("user_id", 123)
            .with_field("username", "john_doe")
            .with_field("tags", json!(["a", "b"]));

        assert_eq!(metadata.len(), 3);
        assert_eq!(metadata.get("user_id"), Some(&json!(123)));
    }

    #[test]
    fn test_metadata_format() {
        let metadata = LogMetadata::new()
            .with_field("key1", "value1")
            .with_field("key2", 42);

        assert_eq!(metadata.format_fields(), "key1=value1 key2=42");
    }

    #[test]
    fn test_metadata_from_json_object() {
        let value = json!({"bot": "relay_bot", "nested": {"depth": 2}});
        let map = value.as_object().cloned().unwrap();
        let metadata = LogMetadata::from(map);

        assert_eq!(metadata.len(), 2);
        let rendered = metadata.to_json_pretty().unwrap();
        assert!(rendered.contains("\"depth\": 2"));
    }

    #[test]
    fn test_metadata_transparent_serde() {
        let metadata = LogMetadata::new().with_field("test", true);
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"test":true}"#);
    }
}
