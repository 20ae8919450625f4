//! JSON -> BSON conversion for CLI input

use bson::oid::ObjectId;
use bson::{Bson, DateTime, Document};

use super::CliError;

/// Convert a JSON value into the BSON value a lookup expects.
///
/// Two extended JSON spellings are recognized: `{"$oid": "<hex>"}` becomes an
/// ObjectId and `{"$date": "<rfc3339>"}` becomes a date. Integers stay 64-bit
/// integers; any other number becomes a double.
pub fn json_to_bson(value: serde_json::Value) -> Result<Bson, CliError> {
    match value {
        serde_json::Value::Null => Ok(Bson::Null),
        serde_json::Value::Bool(b) => Ok(Bson::Boolean(b)),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Bson::Int64(i))
            } else {
                Ok(Bson::Double(n.as_f64().unwrap_or(f64::NAN)))
            }
        }
        serde_json::Value::String(s) => Ok(Bson::String(s)),
        serde_json::Value::Array(items) => items
            .into_iter()
            .map(json_to_bson)
            .collect::<Result<Vec<_>, _>>()
            .map(Bson::Array),
        serde_json::Value::Object(entries) => {
            if entries.len() == 1 {
                if let Some(serde_json::Value::String(hex)) = entries.get("$oid") {
                    let oid = ObjectId::parse_str(hex).map_err(|e| {
                        CliError::InvalidInput(format!("invalid $oid `{}`: {}", hex, e))
                    })?;
                    return Ok(Bson::ObjectId(oid));
                }
                if let Some(serde_json::Value::String(ts)) = entries.get("$date") {
                    let date = DateTime::parse_rfc3339_str(ts).map_err(|e| {
                        CliError::InvalidInput(format!("invalid $date `{}`: {}", ts, e))
                    })?;
                    return Ok(Bson::DateTime(date));
                }
            }
            let mut doc = Document::new();
            for (key, value) in entries {
                doc.insert(key, json_to_bson(value)?);
            }
            Ok(Bson::Document(doc))
        }
    }
}

/// Parse an index definition JSON string into a BSON document.
pub fn parse_definition(definition: &str) -> Result<Document, CliError> {
    let parsed: serde_json::Value = serde_json::from_str(definition).map_err(CliError::Json)?;
    match json_to_bson(parsed)? {
        Bson::Document(doc) => Ok(doc),
        _ => Err(CliError::InvalidInput(
            "index definition must be a JSON object".to_string(),
        )),
    }
}
