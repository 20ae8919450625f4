//! Lookup key classification.
//!
//! A lookup key is a `__`-separated list of tokens: leading tokens name a
//! field path, trailing tokens are operator keywords (`user__name__contains`).
//! The classifier walks the tokens once, resolves identifier aliases, folds
//! negation keywords into a polarity flag and picks the operation the rest of
//! the compiler will build.

use std::collections::BTreeMap;

use bson::Bson;

use crate::error::TransformError;
use crate::operator::RangeBound;
use crate::value::cast_to_object_id;

/// Separator between tokens in a lookup key.
pub const SEPARATOR: &str = "__";

/// Aliases accepted for the identifier field.
pub const ID_ALIASES: &[&str] = &["pk", "id", "_id"];

/// Canonical identifier field name.
pub const ID_FIELD: &str = "_id";

/// A flat mapping of lookup keys to values, the compiler's input.
pub type Lookups = BTreeMap<String, Bson>;

/// What a recognized keyword means to the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeywordCategory {
    /// Toggles polarity; scanning continues (`ne`, `nin`, `not`).
    Negative,
    /// Terminates the path but names no operator; the value's kind decides
    /// (`in`, `is`).
    Inferred,
    /// One bound of a range comparison.
    Range(RangeBound),
    Exists,
    Text,
    Regex,
    All,
    StartsWith,
    EndsWith,
    Size,
    Type,
    /// Recognized but deliberately not implemented (`mod`, `match`).
    Unsupported,
}

/// Keyword table consulted by the classifier. A token found here stops being
/// a path segment; anything else (including `eq`) stays part of the path.
pub const KEYWORDS: &[(&str, KeywordCategory)] = &[
    ("ne", KeywordCategory::Negative),
    ("nin", KeywordCategory::Negative),
    ("not", KeywordCategory::Negative),
    ("in", KeywordCategory::Inferred),
    ("is", KeywordCategory::Inferred),
    ("gt", KeywordCategory::Range(RangeBound::Gt)),
    ("gte", KeywordCategory::Range(RangeBound::Gte)),
    ("lt", KeywordCategory::Range(RangeBound::Lt)),
    ("lte", KeywordCategory::Range(RangeBound::Lte)),
    ("exists", KeywordCategory::Exists),
    ("exact", KeywordCategory::Text),
    ("iexact", KeywordCategory::Text),
    ("contains", KeywordCategory::Text),
    ("icontains", KeywordCategory::Text),
    ("wholeword", KeywordCategory::Text),
    ("iwholeword", KeywordCategory::Text),
    ("startswith", KeywordCategory::StartsWith),
    ("istartswith", KeywordCategory::StartsWith),
    ("endswith", KeywordCategory::EndsWith),
    ("iendswith", KeywordCategory::EndsWith),
    ("regex", KeywordCategory::Regex),
    ("iregex", KeywordCategory::Regex),
    ("all", KeywordCategory::All),
    ("size", KeywordCategory::Size),
    ("type", KeywordCategory::Type),
    ("mod", KeywordCategory::Unsupported),
    ("match", KeywordCategory::Unsupported),
];

pub fn keyword_category(token: &str) -> Option<KeywordCategory> {
    KEYWORDS
        .iter()
        .find(|(keyword, _)| *keyword == token)
        .map(|(_, category)| *category)
}

/// The operation a classified lookup asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// No builder keyword: the value's kind picks equals or text.
    Infer,
    Range(RangeBound),
    Exists,
    Text,
    Regex,
    All,
    StartsWith,
    EndsWith,
    Size,
    Type,
}

/// A lookup key/value pair after classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Lookup {
    /// Dotted field path. Empty when the key held only keywords.
    pub path: String,
    /// The lookup value, identifier-coerced where an alias appeared.
    pub value: Bson,
    /// Polarity after negation keywords; `false` routes to `mustNot`.
    pub positive: bool,
    pub operation: Operation,
}

/// Split a lookup key on `__` and classify it.
///
/// Scanning is left to right. Identifier aliases are rewritten to `_id` and
/// the value is coerced on the spot. The first recognized keyword fixes the
/// field path; negation keywords keep scanning, any other keyword decides the
/// operation and stops. Tokens after the path that match no keyword are
/// ignored. `size` and `type` must be the key's final token.
pub fn classify(key: &str, value: Bson) -> Result<Lookup, TransformError> {
    let mut tokens: Vec<String> = key.split(SEPARATOR).map(str::to_string).collect();
    let mut value = value;
    let mut positive = true;
    let mut path: Option<String> = None;
    let mut operation = Operation::Infer;

    for i in 0..tokens.len() {
        if ID_ALIASES.contains(&tokens[i].as_str()) {
            tokens[i] = ID_FIELD.to_string();
            value = cast_to_object_id(value)?;
        }
        let category = match keyword_category(&tokens[i]) {
            Some(category) => category,
            None => continue,
        };
        if path.is_none() {
            path = Some(tokens[..i].join("."));
        }
        match category {
            KeywordCategory::Negative => positive = !positive,
            KeywordCategory::Inferred => {}
            KeywordCategory::Unsupported => {
                return Err(TransformError::UnsupportedOperator(format!(
                    "`{}` lookups are not implemented",
                    tokens[i]
                )));
            }
            KeywordCategory::Size => {
                if i != tokens.len() - 1 {
                    return Err(TransformError::UnsupportedOperator(format!(
                        "`size` must be the final operator in `{}`",
                        key
                    )));
                }
                operation = Operation::Size;
                break;
            }
            KeywordCategory::Type => {
                if !positive {
                    return Err(TransformError::UnsupportedOperator(
                        "negated `type` lookups are not supported".to_string(),
                    ));
                }
                if i != tokens.len() - 1 {
                    return Err(TransformError::UnsupportedOperator(format!(
                        "`type` must be the final operator in `{}`",
                        key
                    )));
                }
                operation = Operation::Type;
                break;
            }
            KeywordCategory::Range(bound) => {
                operation = Operation::Range(bound);
                break;
            }
            KeywordCategory::Exists => {
                operation = Operation::Exists;
                break;
            }
            KeywordCategory::Text => {
                operation = Operation::Text;
                break;
            }
            KeywordCategory::Regex => {
                operation = Operation::Regex;
                break;
            }
            KeywordCategory::All => {
                operation = Operation::All;
                break;
            }
            KeywordCategory::StartsWith => {
                operation = Operation::StartsWith;
                break;
            }
            KeywordCategory::EndsWith => {
                operation = Operation::EndsWith;
                break;
            }
        }
    }

    let path = match path {
        Some(path) => path,
        None => tokens.join("."),
    };
    Ok(Lookup {
        path,
        value,
        positive,
        operation,
    })
}

#[test]
fn test_keyword_table() {
    assert_eq!(keyword_category("gte"), Some(KeywordCategory::Range(RangeBound::Gte)));
    assert_eq!(keyword_category("icontains"), Some(KeywordCategory::Text));
    assert_eq!(keyword_category("eq"), None);
    assert_eq!(keyword_category("name"), None);
}

#[test]
fn test_polarity_folding() {
    let lookup = classify("field__ne__not__lt", Bson::Int32(3)).unwrap();
    assert_eq!(lookup.path, "field");
    assert!(lookup.positive);
    assert_eq!(lookup.operation, Operation::Range(RangeBound::Lt));
}
