use std::collections::BTreeMap;

use bson::{doc, Bson};
use searchq::{PathType, SearchIndex, Transform, TransformError};

fn compile_against(
    index: &SearchIndex,
    key: &str,
    value: Bson,
) -> Result<searchq::CompiledLookups, TransformError> {
    let lookups = BTreeMap::from([(key.to_string(), value)]);
    Transform::new(&lookups, index).compile()
}

#[test]
fn test_new_index_is_not_ensured() {
    let index = SearchIndex::new("default");

    assert_eq!(index.name(), "default");
    assert!(!index.is_ensured());
    assert!(!index.has_wildcard());
    assert!(!index.is_indexed("anything"));
}

#[test]
fn test_definition_records_paths_and_types() {
    let index = SearchIndex::new("people").with_definition(&doc! {
        "mappings": {
            "dynamic": false,
            "fields": {
                "user": {
                    "fields": {
                        "name": { "type": "string" },
                        "address": {
                            "type": "embeddedDocuments",
                            "fields": { "city": { "type": "string" } },
                        },
                    },
                },
                "age": { "type": "number" },
            },
        },
    });

    assert!(index.is_ensured());
    assert!(!index.has_wildcard());
    assert!(index.is_indexed("user"));
    assert!(index.is_indexed("user.name"));
    assert!(index.is_indexed("user.address"));
    assert!(index.is_indexed("user.address.city"));
    assert!(index.is_indexed("age"));
    assert!(!index.is_indexed("missing"));

    // a mapping without a declared type defaults to "document"
    assert_eq!(index.path_type("user"), PathType::Scalar);
    assert_eq!(index.path_type("user.address"), PathType::EmbeddedDocument);
    assert_eq!(index.path_type("age"), PathType::Scalar);
    assert_eq!(index.path_type("missing"), PathType::Unknown);
}

#[test]
fn test_bare_mappings_document_accepted() {
    let index = SearchIndex::new("slim").with_definition(&doc! {
        "fields": { "title": { "type": "string" } },
    });

    assert!(index.is_ensured());
    assert!(index.is_indexed("title"));
}

#[test]
fn test_dynamic_definition_indexes_everything() {
    let index = SearchIndex::new("catchall").with_definition(&doc! {
        "mappings": { "dynamic": true },
    });

    assert!(index.has_wildcard());
    assert!(index.is_indexed("anything.at.all"));
    assert_eq!(index.path_type("anything.at.all"), PathType::Unknown);
}

#[test]
fn test_array_of_mappings_records_each() {
    let index = SearchIndex::new("multi").with_definition(&doc! {
        "mappings": {
            "fields": {
                "title": [
                    { "type": "string" },
                    { "type": "autocomplete" },
                ],
            },
        },
    });

    assert!(index.is_indexed("title"));
    assert_eq!(index.path_type("title"), PathType::Scalar);
}

#[test]
fn test_embedded_documents_declaration_wins_in_arrays() {
    let embedded_first = SearchIndex::new("a").with_definition(&doc! {
        "mappings": {
            "fields": {
                "items": [
                    { "type": "embeddedDocuments" },
                    { "type": "document" },
                ],
            },
        },
    });
    let embedded_last = SearchIndex::new("b").with_definition(&doc! {
        "mappings": {
            "fields": {
                "items": [
                    { "type": "document" },
                    { "type": "embeddedDocuments" },
                ],
            },
        },
    });

    assert_eq!(embedded_first.path_type("items"), PathType::EmbeddedDocument);
    assert_eq!(embedded_last.path_type("items"), PathType::EmbeddedDocument);
}

#[test]
fn test_indexed_paths_lists_in_path_order() {
    let index = SearchIndex::new("ordered").with_definition(&doc! {
        "mappings": {
            "fields": {
                "b": { "type": "number" },
                "a": { "fields": { "z": { "type": "string" } } },
            },
        },
    });

    let paths: Vec<(&str, &str)> = index.indexed_paths().collect();
    assert_eq!(
        paths,
        vec![("a", "document"), ("a.z", "string"), ("b", "number")]
    );
}

#[test]
fn test_reloading_a_definition_replaces_the_catalog() {
    let mut index = SearchIndex::new("evolving");
    index.load_definition(&doc! { "mappings": { "fields": { "old": { "type": "string" } } } });
    index.load_definition(&doc! { "mappings": { "fields": { "new": { "type": "string" } } } });

    assert!(!index.is_indexed("old"));
    assert!(index.is_indexed("new"));
}

#[test]
fn test_unindexed_path_is_rejected_when_ensured() {
    let index = SearchIndex::new("catalog").with_definition(&doc! {
        "mappings": { "fields": { "name": { "type": "string" } } },
    });

    let err = compile_against(&index, "missing__gt", Bson::Int32(1)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Index field error: path `missing` is not indexed in search index `catalog`"
    );
}

#[test]
fn test_validation_failure_names_the_first_bad_prefix() {
    let index = SearchIndex::new("catalog").with_definition(&doc! {
        "mappings": { "fields": { "name": { "type": "string" } } },
    });

    let err = compile_against(&index, "ghost__sub__gt", Bson::Int32(1)).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Index field error: path `ghost` is not indexed in search index `catalog`"
    );
}

#[test]
fn test_every_prefix_must_be_indexed() {
    // `user.name` maps a leaf without mapping its parent
    let index = SearchIndex::new("catalog").with_definition(&doc! {
        "mappings": { "fields": { "user": { "fields": { "name": { "type": "string" } } } } },
    });

    assert!(compile_against(&index, "user__name", Bson::from("ada")).is_ok());
    let err = compile_against(&index, "user__email", Bson::from("a@b.c")).unwrap_err();
    assert!(matches!(err, TransformError::IndexField(_)));
}

#[test]
fn test_unensured_index_accepts_any_path() {
    let index = SearchIndex::new("default");

    assert!(compile_against(&index, "whatever__gt", Bson::Int32(1)).is_ok());
}

#[test]
fn test_match_stage_lookups_skip_validation() {
    let index = SearchIndex::new("catalog").with_definition(&doc! {
        "mappings": { "fields": { "name": { "type": "string" } } },
    });

    // size and type compile to $match stages that never touch the index
    let compiled = compile_against(&index, "phantom__size", Bson::Int32(0)).unwrap();
    assert_eq!(compiled.other_aggregations.len(), 1);

    let compiled = compile_against(&index, "phantom__type", Bson::from("string")).unwrap();
    assert_eq!(compiled.other_aggregations.len(), 1);
}

#[test]
fn test_wildcard_index_passes_validation() {
    let index = SearchIndex::new("catchall").with_definition(&doc! {
        "mappings": { "dynamic": true },
    });

    assert!(compile_against(&index, "anything__gt", Bson::Int32(1)).is_ok());
}
