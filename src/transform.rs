//! Lookup compilation.
//!
//! [`Transform`] turns a flat mapping of lookup keys (`user__name__contains`)
//! into search operator fragments. Every key compiles independently and lands
//! in one of three output lists:
//!
//! - `affirmative`: fragments the final query must satisfy;
//! - `negative`: fragments the final query must reject;
//! - `other_aggregations`: `$match` stages for conditions the search stage
//!   cannot express (`size`, `type`), to run after it.
//!
//! Negated lookups normally go to `negative` untouched; when a path crosses
//! embedded-document boundaries the fragment is instead wrapped in scoping
//! clauses and the negation moves inside the innermost scope (see
//! [`Transform::wrap_embedded`]), so the wrapped fragment always lands in
//! `affirmative`.

use std::collections::HashMap;

use bson::{Bson, DateTime};
use log::{debug, warn};

use crate::error::TransformError;
use crate::index::{PathType, SearchIndex};
use crate::lookup::{classify, Lookups, Operation};
use crate::operator::{CompoundClauses, MatchStage, RangeBound, SearchOperator, TextPath};
use crate::value::{is_truthy, ValueKind};

/// Output of one compile call.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledLookups {
    /// Fragments the query must satisfy.
    pub affirmative: Vec<SearchOperator>,
    /// Fragments the query must reject.
    pub negative: Vec<SearchOperator>,
    /// `$match` stages to append to the pipeline after the search stage.
    pub other_aggregations: Vec<MatchStage>,
}

/// Compiles a set of lookups against one search index.
///
/// ```
/// use std::collections::BTreeMap;
/// use bson::Bson;
/// use searchq::{SearchIndex, Transform};
///
/// let index = SearchIndex::new("default");
/// let lookups = BTreeMap::from([
///     ("name__contains".to_string(), Bson::from("carla")),
///     ("age__gte".to_string(), Bson::Int32(21)),
/// ]);
/// let compiled = Transform::new(&lookups, &index).compile().unwrap();
/// assert_eq!(compiled.affirmative.len(), 2);
/// assert!(compiled.negative.is_empty());
/// ```
pub struct Transform<'a> {
    lookups: &'a Lookups,
    index: &'a SearchIndex,
}

impl<'a> Transform<'a> {
    pub fn new(lookups: &'a Lookups, index: &'a SearchIndex) -> Transform<'a> {
        Transform { lookups, index }
    }

    /// Compile every lookup, in key order.
    ///
    /// Order only affects the position of fragments in the output lists:
    /// merging of embedded-document scopes is keyed by path, so any iteration
    /// order produces an equivalent query.
    pub fn compile(&self) -> Result<CompiledLookups, TransformError> {
        let mut compiled = CompiledLookups::default();
        // positions of embedded-document scopes inside `affirmative`, by path
        let mut scopes: HashMap<String, usize> = HashMap::new();

        for (key, value) in self.lookups {
            let lookup = classify(key, value.clone())?;
            let mut positive = lookup.positive;

            let operator = match lookup.operation {
                Operation::Size => {
                    let stage = self.size(&lookup.path, &lookup.value, positive)?;
                    compiled.other_aggregations.push(stage);
                    continue;
                }
                Operation::Type => {
                    let stage = self.field_type(&lookup.path, &lookup.value);
                    compiled.other_aggregations.push(stage);
                    continue;
                }
                Operation::Exists => {
                    // exists=false means "filter on absence"
                    if lookup.value == Bson::Boolean(false) {
                        positive = !positive;
                    }
                    self.exists(&lookup.path)
                }
                Operation::Range(bound) => self.range(&lookup.path, &lookup.value, &[bound])?,
                Operation::Text => self.text(&lookup.path, &lookup.value)?,
                Operation::Regex => self.regex(&lookup.path, &lookup.value)?,
                Operation::StartsWith => self.starts_with(&lookup.path, &lookup.value)?,
                Operation::EndsWith => self.ends_with(&lookup.path, &lookup.value)?,
                Operation::All => self.all(&lookup.path, &lookup.value)?,
                Operation::Infer => self.auto(&lookup.path, &lookup.value)?,
            };

            let segments: Vec<&str> = lookup.path.split('.').collect();
            if self.index.is_ensured() {
                self.ensure_path_indexed(&segments)?;
            }

            let (operator, wrapped) = self.wrap_embedded(&segments, "", operator, positive);
            if wrapped {
                merge_scope(&mut compiled.affirmative, &mut scopes, operator);
            } else if positive {
                compiled.affirmative.push(operator);
            } else {
                compiled.negative.push(operator);
            }
        }

        if !compiled.other_aggregations.is_empty() {
            warn!(
                "compiled query mixes $search operators with $match stages, \
                 which run after the search: {:?}",
                compiled.other_aggregations
            );
        }
        debug!(
            "compiled {} lookups: {} affirmative, {} negative, {} match stages",
            self.lookups.len(),
            compiled.affirmative.len(),
            compiled.negative.len(),
            compiled.other_aggregations.len()
        );
        Ok(compiled)
    }

    // ========================================
    // Operator Builders
    // ========================================

    fn range(
        &self,
        path: &str,
        value: &Bson,
        bounds: &[RangeBound],
    ) -> Result<SearchOperator, TransformError> {
        let value = match value {
            Bson::Int32(_) | Bson::Int64(_) => value.clone(),
            // sub-second precision is not comparable across drivers
            Bson::DateTime(dt) => Bson::DateTime(truncate_to_second(*dt)),
            other => {
                return Err(TransformError::InvalidFieldValue(format!(
                    "range search on `{}` requires an int or date value, got {}",
                    path,
                    ValueKind::of(other).name()
                )));
            }
        };
        Ok(SearchOperator::Range {
            path: path.to_string(),
            bounds: bounds.to_vec(),
            value,
        })
    }

    fn exists(&self, path: &str) -> SearchOperator {
        SearchOperator::Exists {
            path: path.to_string(),
        }
    }

    fn text(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        if !is_truthy(value) {
            return Err(TransformError::InvalidFieldValue(format!(
                "text search on `{}` cannot be `{}`",
                path, value
            )));
        }
        let path = if self.index.has_wildcard() {
            TextPath::Wildcard
        } else {
            TextPath::Field(path.to_string())
        };
        Ok(SearchOperator::Text {
            path,
            query: value.clone(),
        })
    }

    fn regex(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        let pattern = value.as_str().ok_or_else(|| {
            TransformError::InvalidFieldValue(format!(
                "regex search on `{}` requires a string pattern, got {}",
                path,
                ValueKind::of(value).name()
            ))
        })?;
        Ok(SearchOperator::Regex {
            path: path.to_string(),
            pattern: pattern.to_string(),
        })
    }

    fn starts_with(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        let literal = escaped_literal(path, value)?;
        Ok(SearchOperator::Regex {
            path: path.to_string(),
            pattern: format!("{}.*", literal),
        })
    }

    fn ends_with(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        let literal = escaped_literal(path, value)?;
        Ok(SearchOperator::Regex {
            path: path.to_string(),
            pattern: format!(".*{}", literal),
        })
    }

    /// Every item dispatches on its own kind; the query requires all of them.
    fn all(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        let items = value.as_array().ok_or_else(|| {
            TransformError::InvalidFieldValue(format!(
                "`all` on `{}` requires a list of values, got {}",
                path,
                ValueKind::of(value).name()
            ))
        })?;
        let mut clauses = CompoundClauses::default();
        for item in items {
            clauses.must.push(self.auto(path, item)?);
        }
        Ok(SearchOperator::Compound(clauses))
    }

    fn size(
        &self,
        path: &str,
        value: &Bson,
        positive: bool,
    ) -> Result<MatchStage, TransformError> {
        match value {
            Bson::Int32(0) | Bson::Int64(0) => Ok(MatchStage::Empty {
                path: path.to_string(),
                negated: !positive,
            }),
            Bson::Int32(_) | Bson::Int64(_) => Err(TransformError::InvalidFieldValue(format!(
                "`size` on `{}` only supports the value 0, got {}",
                path, value
            ))),
            other => Err(TransformError::InvalidFieldValue(format!(
                "`size` on `{}` requires an int value, got {}",
                path,
                ValueKind::of(other).name()
            ))),
        }
    }

    fn field_type(&self, path: &str, value: &Bson) -> MatchStage {
        MatchStage::FieldType {
            path: path.to_string(),
            type_spec: value.clone(),
        }
    }

    // ========================================
    // Type-Directed Dispatch
    // ========================================

    /// Pick `equals` or `text` from the value's kind when the key named no
    /// operator. Lists dispatch on their first element and must be
    /// kind-homogeneous (nulls tolerated).
    fn auto(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        let kind = match value {
            Bson::Array(items) => {
                let first = match items.first() {
                    Some(first) => first,
                    None => {
                        return Err(TransformError::InvalidFieldValue(format!(
                            "equality over a list on `{}` cannot be empty",
                            path
                        )));
                    }
                };
                let first_kind = ValueKind::of(first);
                for item in items {
                    let kind = ValueKind::of(item);
                    if kind != first_kind && kind != ValueKind::Null {
                        return Err(TransformError::InvalidFieldValue(format!(
                            "list elements for `{}` must share one type, found {} and {}",
                            path,
                            first_kind.name(),
                            kind.name()
                        )));
                    }
                }
                first_kind
            }
            Bson::Document(_) => {
                return Err(TransformError::InvalidFieldValue(format!(
                    "a document is not a valid lookup value for `{}`",
                    path
                )));
            }
            other => ValueKind::of(other),
        };
        if kind.is_exact_match() {
            self.equals(path, value)
        } else {
            self.text(path, value)
        }
    }

    fn equals(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        match value {
            Bson::Array(items) => {
                if items.is_empty() {
                    return Err(TransformError::InvalidFieldValue(format!(
                        "equality over a list on `{}` cannot be empty",
                        path
                    )));
                }
                let mut clauses = CompoundClauses::default();
                for item in items {
                    clauses.should.push(self.single_equals(path, item)?);
                }
                clauses.minimum_should_match = Some(1);
                Ok(SearchOperator::Compound(clauses))
            }
            single => self.single_equals(path, single),
        }
    }

    fn single_equals(&self, path: &str, value: &Bson) -> Result<SearchOperator, TransformError> {
        let kind = ValueKind::of(value);
        if !kind.is_exact_match() {
            return Err(TransformError::InvalidFieldValue(format!(
                "equals on `{}` requires a bool, ObjectId, int or date value, got {}",
                path,
                kind.name()
            )));
        }
        Ok(SearchOperator::Equals {
            path: path.to_string(),
            value: value.clone(),
        })
    }

    // ========================================
    // Path Validation and Embedded Scoping
    // ========================================

    /// Every prefix of the path must be indexed, not just the leaf.
    fn ensure_path_indexed(&self, segments: &[&str]) -> Result<(), TransformError> {
        let mut prefix = String::new();
        for segment in segments {
            if !prefix.is_empty() {
                prefix.push('.');
            }
            prefix.push_str(segment);
            if !self.index.is_indexed(&prefix) {
                return Err(TransformError::IndexField(format!(
                    "path `{}` is not indexed in search index `{}`",
                    prefix,
                    self.index.name()
                )));
            }
        }
        Ok(())
    }

    /// Wrap `operator` in one scoping clause per embedded-document prefix of
    /// its path. Returns the (possibly unchanged) operator and whether any
    /// wrap happened.
    ///
    /// The scan consumes segments left to right and stops at the first prefix
    /// that is not an embedded-document type, or when no segments remain
    /// after the prefix; a lookup targeting an embedded field itself (rather
    /// than one of its subfields) stays unwrapped.
    ///
    /// Negation placement: only the innermost wrap honors the caller's
    /// polarity; every outer scope uses `must`. Negating an ancestor scope
    /// would demand that no subdocument matches at all, rather than that some
    /// subdocument fails the innermost condition.
    fn wrap_embedded(
        &self,
        segments: &[&str],
        prefix: &str,
        operator: SearchOperator,
        positive: bool,
    ) -> (SearchOperator, bool) {
        let (first, rest) = match segments.split_first() {
            Some(split) => split,
            None => return (operator, false),
        };
        let partial = if prefix.is_empty() {
            (*first).to_string()
        } else {
            format!("{}.{}", prefix, first)
        };
        if !self.index.is_ensured()
            || self.index.path_type(&partial) != PathType::EmbeddedDocument
            || rest.is_empty()
        {
            return (operator, false);
        }
        let (inner, wrapped_deeper) = self.wrap_embedded(rest, &partial, operator, positive);
        let clauses = if wrapped_deeper || positive {
            CompoundClauses::must(inner)
        } else {
            CompoundClauses::must_not(inner)
        };
        (
            SearchOperator::EmbeddedDocument {
                path: partial,
                operator: clauses,
            },
            true,
        )
    }
}

/// Insert a wrapped fragment into the affirmative list, merging with an
/// existing scope on the same path. Two separate scopes on one path could
/// each match a different subdocument of the same array; merging keeps every
/// condition on one path bound to the same candidate subdocument.
fn merge_scope(
    affirmative: &mut Vec<SearchOperator>,
    scopes: &mut HashMap<String, usize>,
    fragment: SearchOperator,
) {
    match fragment {
        SearchOperator::EmbeddedDocument { path, operator } => match scopes.get(&path) {
            Some(&at) => {
                if let SearchOperator::EmbeddedDocument {
                    operator: existing, ..
                } = &mut affirmative[at]
                {
                    existing.must.extend(operator.must);
                    existing.must_not.extend(operator.must_not);
                }
            }
            None => {
                scopes.insert(path.clone(), affirmative.len());
                affirmative.push(SearchOperator::EmbeddedDocument { path, operator });
            }
        },
        other => affirmative.push(other),
    }
}

fn escaped_literal(path: &str, value: &Bson) -> Result<String, TransformError> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(regex::escape(s)),
        _ => Err(TransformError::InvalidFieldValue(format!(
            "prefix and suffix search on `{}` require a non-empty string, got `{}`",
            path, value
        ))),
    }
}

fn truncate_to_second(value: DateTime) -> DateTime {
    DateTime::from_millis(value.timestamp_millis().div_euclid(1000) * 1000)
}
