//! JSON rendering of compiled fragments.
//!
//! Fragments render to [`bson::Document`]s; this module maps those documents
//! onto `serde_json` values for display. ObjectIds and dates use the relaxed
//! extended JSON spellings (`{"$oid": ...}`, `{"$date": ...}`) so output
//! stays readable and round-trips through the CLI input conversion.

use bson::{Bson, Document};
use serde_json::{json, Map, Number, Value};

/// Render one BSON value as JSON.
pub fn json_value(value: &Bson) -> Value {
    match value {
        Bson::Null => Value::Null,
        Bson::Boolean(b) => Value::Bool(*b),
        Bson::Int32(n) => Value::Number((*n).into()),
        Bson::Int64(n) => Value::Number((*n).into()),
        Bson::Double(n) => Number::from_f64(*n).map(Value::Number).unwrap_or(Value::Null),
        Bson::String(s) => Value::String(s.clone()),
        Bson::Array(items) => Value::Array(items.iter().map(json_value).collect()),
        Bson::Document(doc) => json_document(doc),
        Bson::ObjectId(oid) => json!({ "$oid": oid.to_hex() }),
        Bson::DateTime(dt) => json!({ "$date": dt.try_to_rfc3339_string().unwrap_or_default() }),
        other => Value::String(other.to_string()),
    }
}

fn json_document(doc: &Document) -> Value {
    let mut map = Map::new();
    for (key, value) in doc {
        map.insert(key.clone(), json_value(value));
    }
    // bson force-enables serde_json's `preserve_order`, so the map keeps
    // insertion order; sort explicitly to keep the sorted-key output.
    map.sort_keys();
    Value::Object(map)
}

/// Compact JSON for one rendered fragment document.
///
/// # Examples
///
/// ```
/// use bson::doc;
/// use searchq::output::to_json;
///
/// let doc = doc! { "exists": { "path": "name" } };
/// assert_eq!(to_json(&doc), r#"{"exists":{"path":"name"}}"#);
/// ```
pub fn to_json(doc: &Document) -> String {
    serde_json::to_string(&json_document(doc)).unwrap_or_default()
}

/// Pretty JSON (2-space indentation) for one rendered fragment document.
pub fn to_json_pretty(doc: &Document) -> String {
    serde_json::to_string_pretty(&json_document(doc)).unwrap_or_default()
}
