//! Search operator fragments.
//!
//! Compilation produces trees of these fragments rather than raw documents:
//! the shapes stay inspectable (and mergeable) until the caller renders them
//! with [`SearchOperator::to_document`]. Two families exist:
//!
//! - [`SearchOperator`]: operators that live inside the `$search` stage
//!   (`range`, `equals`, `text`, `regex`, `exists`, `compound`,
//!   `embeddedDocument`);
//! - [`MatchStage`]: conditions Atlas Search cannot express, emitted as
//!   separate `$match` aggregation stages to run after the search.

use bson::{bson, doc, Bson, Document};

/// One bound of a `range` operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeBound {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl RangeBound {
    pub fn as_str(&self) -> &'static str {
        match self {
            RangeBound::Gt => "gt",
            RangeBound::Gte => "gte",
            RangeBound::Lt => "lt",
            RangeBound::Lte => "lte",
        }
    }
}

/// Path argument of a `text` operator.
///
/// When the index carries a `*` entry every field is searchable and the
/// literal path is replaced by the wildcard form.
#[derive(Debug, Clone, PartialEq)]
pub enum TextPath {
    Field(String),
    Wildcard,
}

impl TextPath {
    pub fn to_bson(&self) -> Bson {
        match self {
            TextPath::Field(path) => Bson::String(path.clone()),
            TextPath::Wildcard => Bson::Document(doc! { "wildcard": "*" }),
        }
    }
}

/// Clause lists of a `compound` operator. Only populated lists render.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompoundClauses {
    pub must: Vec<SearchOperator>,
    pub must_not: Vec<SearchOperator>,
    pub should: Vec<SearchOperator>,
    pub minimum_should_match: Option<i32>,
}

impl CompoundClauses {
    pub fn must(clause: SearchOperator) -> CompoundClauses {
        CompoundClauses {
            must: vec![clause],
            ..CompoundClauses::default()
        }
    }

    pub fn must_not(clause: SearchOperator) -> CompoundClauses {
        CompoundClauses {
            must_not: vec![clause],
            ..CompoundClauses::default()
        }
    }

    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        if !self.must.is_empty() {
            doc.insert("must", render_all(&self.must));
        }
        if !self.must_not.is_empty() {
            doc.insert("mustNot", render_all(&self.must_not));
        }
        if !self.should.is_empty() {
            doc.insert("should", render_all(&self.should));
        }
        if let Some(minimum) = self.minimum_should_match {
            doc.insert("minimumShouldMatch", minimum);
        }
        doc
    }
}

fn render_all(clauses: &[SearchOperator]) -> Vec<Document> {
    clauses.iter().map(SearchOperator::to_document).collect()
}

/// A fragment of a `$search` compound query.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOperator {
    /// `range` over one path; every bound shares the same value.
    Range {
        path: String,
        bounds: Vec<RangeBound>,
        value: Bson,
    },
    /// `equals`: exact match on a primitive value.
    Equals { path: String, value: Bson },
    /// `text`: analyzed full-text match.
    Text { path: TextPath, query: Bson },
    /// `regex` with the pattern passed through verbatim.
    Regex { path: String, pattern: String },
    /// `exists`: the field is present.
    Exists { path: String },
    /// `compound` with explicit clause lists.
    Compound(CompoundClauses),
    /// `embeddedDocument` scope around a compound of inner conditions. The
    /// inner operator is always a compound; the merger relies on that.
    EmbeddedDocument {
        path: String,
        operator: CompoundClauses,
    },
}

impl SearchOperator {
    pub fn to_document(&self) -> Document {
        match self {
            SearchOperator::Range {
                path,
                bounds,
                value,
            } => {
                let mut body = doc! { "path": path.as_str() };
                for bound in bounds {
                    body.insert(bound.as_str(), value.clone());
                }
                doc! { "range": body }
            }
            SearchOperator::Equals { path, value } => doc! {
                "equals": { "path": path.as_str(), "value": value.clone() }
            },
            SearchOperator::Text { path, query } => doc! {
                "text": { "query": query.clone(), "path": path.to_bson() }
            },
            SearchOperator::Regex { path, pattern } => doc! {
                "regex": { "query": pattern.as_str(), "path": path.as_str() }
            },
            SearchOperator::Exists { path } => doc! {
                "exists": { "path": path.as_str() }
            },
            SearchOperator::Compound(clauses) => doc! {
                "compound": clauses.to_document()
            },
            SearchOperator::EmbeddedDocument { path, operator } => doc! {
                "embeddedDocument": {
                    "path": path.as_str(),
                    "operator": { "compound": operator.to_document() },
                }
            },
        }
    }
}

/// A `$match` aggregation stage for conditions `$search` cannot express.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchStage {
    /// Field exists and equals (or differs from) the empty sentinel
    /// `[null, [], ""]`. Produced by `size` lookups with value 0.
    Empty { path: String, negated: bool },
    /// Field has the given BSON `$type`.
    FieldType { path: String, type_spec: Bson },
}

impl MatchStage {
    pub fn to_document(&self) -> Document {
        match self {
            MatchStage::Empty { path, negated } => {
                let mut cond = doc! { "$exists": true };
                let comparator = if *negated { "$ne" } else { "$eq" };
                cond.insert(comparator, bson!([null, [], ""]));
                let mut target = Document::new();
                target.insert(path.clone(), cond);
                doc! { "$match": target }
            }
            MatchStage::FieldType { path, type_spec } => {
                let mut target = Document::new();
                target.insert(path.clone(), doc! { "$type": type_spec.clone() });
                doc! { "$match": target }
            }
        }
    }

    pub fn path(&self) -> &str {
        match self {
            MatchStage::Empty { path, .. } => path,
            MatchStage::FieldType { path, .. } => path,
        }
    }
}
