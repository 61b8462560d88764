pub mod searchable;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::sync::Arc;

pub use searchable::{coerce_text, lookup, Searchable, NESTED_FIELDS_KEY};

use crate::table::IdExtractor;

/// Errors that can occur while building records from JSON input
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("Invalid JSON format: {0}")]
    InvalidJson(String),
}

/// A dynamic record as returned by the backend query layer.
///
/// Records are plain JSON objects. Some carry their user-defined values in a
/// nested `fields` mapping next to system properties such as `record_id` or
/// `created_at`; others keep everything at the top level. Both shapes resolve
/// through [`Record::field`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    properties: Map<String, Value>,
}

impl Record {
    /// Create a new empty record
    pub fn new() -> Self {
        Self::default()
    }

    /// Create record from a JSON object
    pub fn from_json(json: Value) -> Result<Self, RecordError> {
        match json {
            Value::Object(properties) => Ok(Self { properties }),
            _ => Err(RecordError::InvalidJson("Expected JSON object".to_string())),
        }
    }

    /// Top-level property
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }

    /// Nested `fields` mapping, if the record carries one
    pub fn fields(&self) -> Option<&Map<String, Value>> {
        match self.properties.get(NESTED_FIELDS_KEY) {
            Some(Value::Object(nested)) => Some(nested),
            _ => None,
        }
    }

    /// Resolve a field the way table searches do: nested mapping first when present
    pub fn field(&self, key: &str) -> Option<&Value> {
        lookup(&self.properties, key)
    }

    /// Set a top-level property
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Set a field value, writing into the nested mapping when the record has one
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        match self.properties.get_mut(NESTED_FIELDS_KEY) {
            Some(Value::Object(nested)) => {
                nested.insert(key.into(), value.into());
            }
            _ => {
                self.properties.insert(key.into(), value.into());
            }
        }
        self
    }

    /// Text identity of this record under `id_field`: top-level property first,
    /// then the nested mapping. Missing identities are empty strings.
    pub fn identity(&self, id_field: &str) -> String {
        self.properties
            .get(id_field)
            .or_else(|| self.fields().and_then(|nested| nested.get(id_field)))
            .and_then(coerce_text)
            .map(Cow::into_owned)
            .unwrap_or_default()
    }

    /// Identity extractor for tables over records
    pub fn id_extractor(id_field: impl Into<String>) -> IdExtractor<Record> {
        let id_field = id_field.into();
        Arc::new(move |record: &Record| record.identity(&id_field))
    }

    /// Number of top-level properties
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Convert to JSON Value
    pub fn to_json(&self) -> Value {
        Value::Object(self.properties.clone())
    }

    /// Convert to serde_json::Map
    pub fn to_map(&self) -> Map<String, Value> {
        self.properties.clone()
    }
}

impl Searchable for Record {
    fn search_text(&self, key: &str) -> Option<Cow<'_, str>> {
        self.field(key).and_then(coerce_text)
    }
}

// ========================================
// Conversions
// ========================================

impl From<Map<String, Value>> for Record {
    fn from(properties: Map<String, Value>) -> Self {
        Self { properties }
    }
}

impl From<Record> for Value {
    fn from(record: Record) -> Self {
        Value::Object(record.properties)
    }
}

impl TryFrom<Value> for Record {
    type Error = RecordError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        Self::from_json(value)
    }
}

// ========================================
// Bulk Conversion Helpers
// ========================================

impl Record {
    /// Convert JSON array to Vec<Record> with proper error handling
    pub fn from_json_array(json: Value) -> Result<Vec<Self>, RecordError> {
        match json {
            Value::Array(array) => {
                let mut records = Vec::with_capacity(array.len());
                for (index, item) in array.into_iter().enumerate() {
                    let record = Self::from_json(item)
                        .map_err(|e| RecordError::InvalidJson(format!("Item {}: {}", index, e)))?;
                    records.push(record);
                }
                Ok(records)
            }
            _ => Err(RecordError::InvalidJson("Expected JSON array".to_string())),
        }
    }

    /// Handles both single objects and arrays
    pub fn from_json_flexible(json: Value) -> Result<Vec<Self>, RecordError> {
        match json {
            Value::Array(_) => Self::from_json_array(json),
            Value::Object(_) => Ok(vec![Self::from_json(json)?]),
            _ => Err(RecordError::InvalidJson("Expected JSON object or array".to_string())),
        }
    }
}

impl std::fmt::Display for Record {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Record(properties: {}, nested: {})",
            self.properties.len(),
            self.fields().is_some()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn rejects_non_objects() {
        assert!(Record::from_json(json!([1, 2])).is_err());
        assert!(Record::from_json(json!("x")).is_err());
    }

    #[test]
    fn array_errors_name_the_offending_item() {
        let err = Record::from_json_array(json!([{"a": 1}, 5])).unwrap_err();
        assert!(err.to_string().contains("Item 1"), "{}", err);
    }

    #[test]
    fn flexible_accepts_single_object() {
        let records = Record::from_json_flexible(json!({"id": "1"})).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn field_resolution_prefers_nested_mapping() {
        let record = Record::from_json(json!({
            "record_id": "r1",
            "fields": {"name": "Acme"}
        }))
        .unwrap();
        assert_eq!(record.field("name"), Some(&json!("Acme")));
        // system properties are not visible through the nested lookup
        assert_eq!(record.field("record_id"), None);
        assert_eq!(record.get("record_id"), Some(&json!("r1")));
    }

    #[test]
    fn set_field_writes_into_nested_mapping() {
        let mut record = Record::from_json(json!({"fields": {"owner": "u1"}})).unwrap();
        record.set_field("owner", "Jane");
        assert_eq!(record.field("owner"), Some(&json!("Jane")));
        assert_eq!(record.get("owner"), None);
    }

    #[test]
    fn identity_reads_top_level_then_nested() {
        let flat = Record::from_json(json!({"id": 7})).unwrap();
        assert_eq!(flat.identity("id"), "7");

        let nested = Record::from_json(json!({"fields": {"code": "X-1"}})).unwrap();
        assert_eq!(nested.identity("code"), "X-1");
        assert_eq!(nested.identity("missing"), "");
    }

    #[test]
    fn serializes_transparently() {
        let record = Record::from_json(json!({"id": "1", "name": "Alice"})).unwrap();
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value, json!({"id": "1", "name": "Alice"}));
        let back: Record = serde_json::from_value(value).unwrap();
        assert_eq!(back, record);
    }
}
