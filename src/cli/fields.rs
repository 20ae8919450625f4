//! List the paths a search index definition covers

use super::{parse_definition, CliError};
use crate::SearchIndex;

/// Options for the fields command
#[derive(Debug, Clone, Default)]
pub struct FieldsOptions {
    /// Index definition JSON (full definition or bare mappings)
    pub definition: String,
}

/// Result of a fields operation
#[derive(Debug, Clone, PartialEq)]
pub struct FieldsResult {
    /// Whether the mappings are dynamic (every field indexed)
    pub dynamic: bool,
    /// Indexed paths with their declared mapping types, in path order
    pub paths: Vec<(String, String)>,
}

/// Parse a definition and report what it indexes.
pub fn execute_fields(options: &FieldsOptions) -> Result<FieldsResult, CliError> {
    let definition = parse_definition(&options.definition)?;
    let index = SearchIndex::new("").with_definition(&definition);
    Ok(FieldsResult {
        dynamic: index.has_wildcard(),
        paths: index
            .indexed_paths()
            .map(|(path, declared)| (path.to_string(), declared.to_string()))
            .collect(),
    })
}
