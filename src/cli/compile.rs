//! Compile lookups into search operator JSON

use std::collections::BTreeMap;

use bson::{Bson, Document};
use serde_json::json;

use super::{json_to_bson, parse_definition, CliError};
use crate::lookup::Lookups;
use crate::output::json_value;
use crate::{SearchIndex, Transform};

/// Options for the compile command
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Lookups as a JSON object (`{"field__op": value}`)
    pub lookups: Option<String>,
    /// Index definition JSON (full definition or bare mappings)
    pub definition: Option<String>,
    /// Search index name, used in error messages
    pub index_name: String,
}

/// Compile one lookup mapping and return the three fragment lists as JSON.
pub fn execute_compile(options: &CompileOptions) -> Result<serde_json::Value, CliError> {
    let raw = options.lookups.as_ref().ok_or(CliError::NoInput)?;
    let parsed: serde_json::Value = serde_json::from_str(raw).map_err(CliError::Json)?;
    let entries = match parsed {
        serde_json::Value::Object(entries) => entries,
        _ => {
            return Err(CliError::InvalidInput(
                "lookups must be a JSON object".to_string(),
            ));
        }
    };

    let mut lookups: Lookups = BTreeMap::new();
    for (key, value) in entries {
        lookups.insert(key, json_to_bson(value)?);
    }

    let mut index = SearchIndex::new(options.index_name.as_str());
    if let Some(definition) = &options.definition {
        index.load_definition(&parse_definition(definition)?);
    }

    let compiled = Transform::new(&lookups, &index)
        .compile()
        .map_err(CliError::Transform)?;

    Ok(json!({
        "affirmative": render(compiled.affirmative.iter().map(|op| op.to_document())),
        "negative": render(compiled.negative.iter().map(|op| op.to_document())),
        "other_aggregations": render(
            compiled.other_aggregations.iter().map(|stage| stage.to_document())
        ),
    }))
}

fn render(documents: impl Iterator<Item = Document>) -> Vec<serde_json::Value> {
    documents
        .map(|doc| json_value(&Bson::Document(doc)))
        .collect()
}
