//! Raw documents and the typed field values stored in them.
//!
//! Fields are kept in the Firestore REST value encoding
//! (`{"stringValue": "…"}`, `{"booleanValue": true}`, …) so that both store
//! backends share one representation and a document can be copied verbatim.

use crate::types::Stamp;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

// ---------------------------------------------------------------------------
// Field names
// ---------------------------------------------------------------------------

pub mod fields {
    //! Persisted field names. Each slice lists the primary name first, then
    //! legacy aliases in priority order.

    pub const WORKER_ID: &[&str] = &["ID"];
    pub const ROLE: &[&str] = &["role", "team role"];
    pub const LAST_FLAGGED: &[&str] = &["last flagged"];
    pub const REVIEW: &[&str] = &["Review", "content review"];
    pub const LINK: &[&str] = &["link"];
    pub const FLAG: &[&str] = &["flag"];
    pub const ACTION: &[&str] = &["action"];
    pub const ACTION_TIMESTAMP: &[&str] = &["action_timestamp"];

    pub const FLAG_FIELD: &str = "flag";
    pub const ACTION_FIELD: &str = "action";
    pub const ACTION_TIMESTAMP_FIELD: &str = "action_timestamp";
    pub const LAST_FLAGGED_FIELD: &str = "last flagged";
}

// ---------------------------------------------------------------------------
// FieldValue
// ---------------------------------------------------------------------------

/// A decoded view of one encoded field value.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<'a> {
    Null,
    Bool(bool),
    Integer(i64),
    Double(f64),
    String(&'a str),
    Timestamp(&'a str),
    Other,
}

impl<'a> FieldValue<'a> {
    pub fn decode(value: &'a Value) -> Self {
        let Some(obj) = value.as_object() else {
            return FieldValue::Other;
        };
        if obj.contains_key("nullValue") {
            return FieldValue::Null;
        }
        if let Some(b) = obj.get("booleanValue").and_then(Value::as_bool) {
            return FieldValue::Bool(b);
        }
        if let Some(s) = obj.get("stringValue").and_then(Value::as_str) {
            return FieldValue::String(s);
        }
        if let Some(s) = obj.get("timestampValue").and_then(Value::as_str) {
            return FieldValue::Timestamp(s);
        }
        // integerValue is a decimal string on the wire.
        if let Some(v) = obj.get("integerValue") {
            let parsed = match v {
                Value::String(s) => s.parse().ok(),
                other => other.as_i64(),
            };
            if let Some(n) = parsed {
                return FieldValue::Integer(n);
            }
        }
        if let Some(d) = obj.get("doubleValue").and_then(Value::as_f64) {
            return FieldValue::Double(d);
        }
        FieldValue::Other
    }
}

pub fn string_value(s: impl Into<String>) -> Value {
    json!({ "stringValue": s.into() })
}

pub fn bool_value(b: bool) -> Value {
    json!({ "booleanValue": b })
}

pub fn timestamp_value(at: chrono::DateTime<chrono::Utc>) -> Value {
    json!({ "timestampValue": at.to_rfc3339_opts(chrono::SecondsFormat::Micros, true) })
}

pub fn null_value() -> Value {
    json!({ "nullValue": null })
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// One stored document: its id within the collection plus encoded fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    #[serde(default)]
    pub fields: Map<String, Value>,
}

impl Document {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// First present field among `names` (primary, then aliases).
    pub fn resolve(&self, names: &[&str]) -> Option<&Value> {
        names.iter().find_map(|n| self.fields.get(*n))
    }

    pub fn string(&self, names: &[&str]) -> Option<String> {
        match FieldValue::decode(self.resolve(names)?) {
            FieldValue::String(s) | FieldValue::Timestamp(s) => Some(s.to_string()),
            FieldValue::Integer(n) => Some(n.to_string()),
            FieldValue::Double(d) => Some(d.to_string()),
            FieldValue::Bool(b) => Some(b.to_string()),
            FieldValue::Null | FieldValue::Other => None,
        }
    }

    pub fn bool(&self, names: &[&str]) -> Option<bool> {
        match FieldValue::decode(self.resolve(names)?) {
            FieldValue::Bool(b) => Some(b),
            FieldValue::Integer(n) => Some(n != 0),
            _ => None,
        }
    }

    pub fn stamp(&self, names: &[&str]) -> Option<Stamp> {
        match FieldValue::decode(self.resolve(names)?) {
            FieldValue::Timestamp(s) => Some(Stamp::parse(s)),
            FieldValue::String(s) if !s.trim().is_empty() => Some(Stamp::parse(s)),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_prefers_primary_name() {
        let doc = Document::new("w1")
            .with_field("team role", string_value("legacy"))
            .with_field("role", string_value("analyst"));
        assert_eq!(doc.string(fields::ROLE).as_deref(), Some("analyst"));
    }

    #[test]
    fn resolve_falls_back_to_alias() {
        let doc = Document::new("w1").with_field("team role", string_value("developer"));
        assert_eq!(doc.string(fields::ROLE).as_deref(), Some("developer"));
    }

    #[test]
    fn present_but_empty_primary_wins_over_alias() {
        let doc = Document::new("w1")
            .with_field("Review", string_value(""))
            .with_field("content review", string_value("old note"));
        assert_eq!(doc.string(fields::REVIEW).as_deref(), Some(""));
    }

    #[test]
    fn integer_values_decode_from_strings() {
        let v = json!({ "integerValue": "42" });
        assert_eq!(FieldValue::decode(&v), FieldValue::Integer(42));
    }

    #[test]
    fn null_and_unknown_values_decode() {
        assert_eq!(FieldValue::decode(&null_value()), FieldValue::Null);
        let map = json!({ "mapValue": { "fields": {} } });
        assert_eq!(FieldValue::decode(&map), FieldValue::Other);
    }

    #[test]
    fn bool_accepts_integer_flags() {
        let doc = Document::new("w1").with_field("flag", json!({ "integerValue": "1" }));
        assert_eq!(doc.bool(fields::FLAG), Some(true));
    }

    #[test]
    fn stamp_reads_timestamp_value() {
        let at = chrono::DateTime::parse_from_rfc3339("2024-01-02T03:04:05Z")
            .unwrap()
            .with_timezone(&chrono::Utc);
        let doc = Document::new("w1").with_field("last flagged", timestamp_value(at));
        assert_eq!(doc.stamp(fields::LAST_FLAGGED), Some(Stamp::from(at)));
    }

    #[test]
    fn document_serializes_with_fields() {
        let doc = Document::new("w1").with_field("flag", bool_value(true));
        let v = serde_json::to_value(&doc).unwrap();
        assert_eq!(v["id"], "w1");
        assert_eq!(v["fields"]["flag"]["booleanValue"], true);
    }
}
