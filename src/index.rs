//! Catalog view of one Atlas Search index.
//!
//! The compiler never talks to a cluster; it works from a local copy of the
//! index definition. Loading a definition records every mapped path with its
//! declared type so lookups can be validated and embedded-document paths can
//! be recognized.

use std::collections::BTreeMap;

use bson::{Bson, Document};

const EMBEDDED_DOCUMENTS_TYPE: &str = "embeddedDocuments";
const DEFAULT_MAPPING_TYPE: &str = "document";

/// How a path is declared in the index mappings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathType {
    /// Declared `embeddedDocuments`: conditions on subfields must be scoped
    /// with an `embeddedDocument` operator.
    EmbeddedDocument,
    /// Declared with any other mapping type.
    Scalar,
    /// Not present in the mappings.
    Unknown,
}

/// What the compiler knows about one search index: its name, whether its
/// field mappings have been loaded, and the declared type of every indexed
/// path.
///
/// An index whose mappings were never loaded is "not ensured": path
/// validation and embedded-document wrapping are both skipped, and the
/// compiler trusts the caller.
#[derive(Debug, Clone)]
pub struct SearchIndex {
    name: String,
    ensured: bool,
    wildcard: bool,
    fields: BTreeMap<String, String>,
}

impl SearchIndex {
    pub fn new(name: impl Into<String>) -> SearchIndex {
        SearchIndex {
            name: name.into(),
            ensured: false,
            wildcard: false,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_definition(mut self, definition: &Document) -> SearchIndex {
        self.load_definition(definition);
        self
    }

    /// Load field mappings from an index definition and mark the index
    /// ensured.
    ///
    /// Accepts either a full definition (`{"mappings": {...}}`) or the bare
    /// mappings document. `dynamic: true` at the top level marks every path
    /// indexed; nested dynamic flags are not tracked. A path mapped to an
    /// array of definitions is recorded once per definition, with an
    /// `embeddedDocuments` declaration winning over the others.
    pub fn load_definition(&mut self, definition: &Document) {
        self.fields.clear();
        self.wildcard = false;
        let mappings = definition.get_document("mappings").unwrap_or(definition);
        if mappings.get_bool("dynamic").unwrap_or(false) {
            self.wildcard = true;
        }
        if let Ok(fields) = mappings.get_document("fields") {
            for (name, spec) in fields {
                self.record_field(name.clone(), spec);
            }
        }
        self.ensured = true;
    }

    fn record_field(&mut self, path: String, spec: &Bson) {
        match spec {
            Bson::Document(mapping) => {
                let declared = mapping.get_str("type").unwrap_or(DEFAULT_MAPPING_TYPE);
                let previous = self.fields.get(&path).map(String::as_str);
                if previous != Some(EMBEDDED_DOCUMENTS_TYPE) {
                    self.fields.insert(path.clone(), declared.to_string());
                }
                if let Ok(subfields) = mapping.get_document("fields") {
                    for (name, sub) in subfields {
                        self.record_field(format!("{}.{}", path, name), sub);
                    }
                }
            }
            Bson::Array(mappings) => {
                for mapping in mappings {
                    self.record_field(path.clone(), mapping);
                }
            }
            _ => {}
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether field mappings have been loaded for this index.
    pub fn is_ensured(&self) -> bool {
        self.ensured
    }

    /// Whether the mappings declare the index dynamic, indexing every field.
    pub fn has_wildcard(&self) -> bool {
        self.wildcard
    }

    pub fn is_indexed(&self, path: &str) -> bool {
        self.wildcard || self.fields.contains_key(path)
    }

    pub fn path_type(&self, path: &str) -> PathType {
        match self.fields.get(path).map(String::as_str) {
            None => PathType::Unknown,
            Some(EMBEDDED_DOCUMENTS_TYPE) => PathType::EmbeddedDocument,
            Some(_) => PathType::Scalar,
        }
    }

    /// Indexed paths and their declared types, in path order.
    pub fn indexed_paths(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(path, declared)| (path.as_str(), declared.as_str()))
    }
}
