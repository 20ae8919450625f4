use bson::{doc, Bson};
use searchq::{CompiledLookups, Lookups, SearchIndex, Transform};

fn nested_index() -> SearchIndex {
    SearchIndex::new("reviews").with_definition(&doc! {
        "mappings": {
            "dynamic": false,
            "fields": {
                "comments": {
                    "type": "embeddedDocuments",
                    "fields": {
                        "replies": {
                            "type": "embeddedDocuments",
                            "fields": { "votes": { "type": "number" } },
                        },
                        "rating": { "type": "number" },
                        "author": { "type": "string" },
                    },
                },
                "meta": {
                    "type": "document",
                    "fields": { "views": { "type": "number" } },
                },
                "status": { "type": "string" },
            },
        },
    })
}

fn lookups(pairs: &[(&str, Bson)]) -> Lookups {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.clone()))
        .collect()
}

fn compile(lookups: &Lookups, index: &SearchIndex) -> CompiledLookups {
    Transform::new(lookups, index).compile().unwrap()
}

#[test]
fn test_lookup_inside_embedded_scope_is_wrapped() {
    let index = nested_index();
    let input = lookups(&[("comments__rating__gt", Bson::Int32(3))]);
    let compiled = compile(&input, &index);

    assert_eq!(compiled.affirmative.len(), 1);
    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "embeddedDocument": {
            "path": "comments",
            "operator": { "compound": { "must": [
                { "range": { "path": "comments.rating", "gt": 3 } },
            ] } },
        } }
    );
}

#[test]
fn test_negation_moves_inside_the_scope() {
    let index = nested_index();
    let input = lookups(&[("comments__rating__ne", Bson::Int32(3))]);
    let compiled = compile(&input, &index);

    // the wrapped fragment is affirmative; the negation lives in mustNot
    assert!(compiled.negative.is_empty());
    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "embeddedDocument": {
            "path": "comments",
            "operator": { "compound": { "mustNot": [
                { "equals": { "path": "comments.rating", "value": 3 } },
            ] } },
        } }
    );
}

#[test]
fn test_double_nesting_keeps_negation_innermost() {
    let index = nested_index();
    let input = lookups(&[("comments__replies__votes__ne", Bson::Int32(5))]);
    let compiled = compile(&input, &index);

    assert!(compiled.negative.is_empty());
    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "embeddedDocument": {
            "path": "comments",
            "operator": { "compound": { "must": [
                { "embeddedDocument": {
                    "path": "comments.replies",
                    "operator": { "compound": { "mustNot": [
                        { "equals": { "path": "comments.replies.votes", "value": 5 } },
                    ] } },
                } },
            ] } },
        } }
    );
}

#[test]
fn test_lookup_on_the_embedded_field_itself_stays_unwrapped() {
    let index = nested_index();
    let input = lookups(&[("comments__exists", Bson::Boolean(true))]);
    let compiled = compile(&input, &index);

    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "exists": { "path": "comments" } }
    );
}

#[test]
fn test_document_typed_prefix_is_not_scoped() {
    let index = nested_index();
    let input = lookups(&[("meta__views__gt", Bson::Int32(10))]);
    let compiled = compile(&input, &index);

    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "range": { "path": "meta.views", "gt": 10 } }
    );
}

#[test]
fn test_unensured_index_never_wraps() {
    let index = SearchIndex::new("default");
    let input = lookups(&[("comments__rating__gt", Bson::Int32(3))]);
    let compiled = compile(&input, &index);

    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "range": { "path": "comments.rating", "gt": 3 } }
    );
}

#[test]
fn test_conditions_on_one_scope_merge() {
    let index = nested_index();
    let input = lookups(&[
        ("comments__author__contains", Bson::from("ada")),
        ("comments__rating__gt", Bson::Int32(3)),
    ]);
    let compiled = compile(&input, &index);

    assert_eq!(compiled.affirmative.len(), 1);
    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "embeddedDocument": {
            "path": "comments",
            "operator": { "compound": { "must": [
                { "text": { "query": "ada", "path": "comments.author" } },
                { "range": { "path": "comments.rating", "gt": 3 } },
            ] } },
        } }
    );
}

#[test]
fn test_merge_keeps_polarities_apart() {
    let index = nested_index();
    let input = lookups(&[
        ("comments__author__not__contains", Bson::from("spam")),
        ("comments__rating__gt", Bson::Int32(3)),
    ]);
    let compiled = compile(&input, &index);

    assert_eq!(compiled.affirmative.len(), 1);
    assert!(compiled.negative.is_empty());
    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "embeddedDocument": {
            "path": "comments",
            "operator": { "compound": {
                "must": [{ "range": { "path": "comments.rating", "gt": 3 } }],
                "mustNot": [{ "text": { "query": "spam", "path": "comments.author" } }],
            } },
        } }
    );
}

#[test]
fn test_nested_scope_merges_into_outer() {
    let index = nested_index();
    let input = lookups(&[
        ("comments__rating__gt", Bson::Int32(3)),
        ("comments__replies__votes__gt", Bson::Int32(1)),
    ]);
    let compiled = compile(&input, &index);

    assert_eq!(compiled.affirmative.len(), 1);
    assert_eq!(
        compiled.affirmative[0].to_document(),
        doc! { "embeddedDocument": {
            "path": "comments",
            "operator": { "compound": { "must": [
                { "range": { "path": "comments.rating", "gt": 3 } },
                { "embeddedDocument": {
                    "path": "comments.replies",
                    "operator": { "compound": { "must": [
                        { "range": { "path": "comments.replies.votes", "gt": 1 } },
                    ] } },
                } },
            ] } },
        } }
    );
}

#[test]
fn test_scoped_and_plain_lookups_coexist() {
    let index = nested_index();
    let input = lookups(&[
        ("comments__rating__gt", Bson::Int32(3)),
        ("status", Bson::from("active")),
    ]);
    let compiled = compile(&input, &index);

    assert_eq!(compiled.affirmative.len(), 2);
    assert_eq!(
        compiled.affirmative[1].to_document(),
        doc! { "text": { "query": "active", "path": "status" } }
    );
}
