use bson::oid::ObjectId;
use bson::Bson;

use crate::error::TransformError;

/// The kind of a BSON value, as far as lookup compilation cares.
///
/// Computed once per lookup and matched on afterwards. BSON variants with no
/// meaning inside a lookup (binary, regular expressions, internal replication
/// timestamps, min/max keys, ...) all collapse into [`ValueKind::Other`].
///
/// # Examples
///
/// ```
/// use bson::Bson;
/// use searchq::ValueKind;
///
/// assert_eq!(ValueKind::of(&Bson::Int32(3)), ValueKind::Integer);
/// assert_eq!(ValueKind::of(&Bson::Int64(3)), ValueKind::Integer);
/// assert!(ValueKind::of(&Bson::Boolean(true)).is_exact_match());
/// assert!(!ValueKind::of(&Bson::from("text")).is_exact_match());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    Null,
    Boolean,
    Integer,
    Double,
    String,
    ObjectId,
    DateTime,
    Array,
    Document,
    Other,
}

impl ValueKind {
    pub fn of(value: &Bson) -> ValueKind {
        match value {
            Bson::Null => ValueKind::Null,
            Bson::Boolean(_) => ValueKind::Boolean,
            Bson::Int32(_) | Bson::Int64(_) => ValueKind::Integer,
            Bson::Double(_) => ValueKind::Double,
            Bson::String(_) => ValueKind::String,
            Bson::ObjectId(_) => ValueKind::ObjectId,
            Bson::DateTime(_) => ValueKind::DateTime,
            Bson::Array(_) => ValueKind::Array,
            Bson::Document(_) => ValueKind::Document,
            _ => ValueKind::Other,
        }
    }

    /// Kinds the `equals` operator accepts; everything else goes through the
    /// text builder when no explicit keyword picked an operator.
    pub fn is_exact_match(&self) -> bool {
        matches!(
            self,
            ValueKind::Boolean | ValueKind::ObjectId | ValueKind::Integer | ValueKind::DateTime
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            ValueKind::Null => "null",
            ValueKind::Boolean => "bool",
            ValueKind::Integer => "int",
            ValueKind::Double => "float",
            ValueKind::String => "string",
            ValueKind::ObjectId => "ObjectId",
            ValueKind::DateTime => "date",
            ValueKind::Array => "array",
            ValueKind::Document => "document",
            ValueKind::Other => "other",
        }
    }
}

/// Check if a lookup value is truthy: null, `false`, `0`, `0.0`, `""`, `[]`
/// and `{}` are falsy, everything else is truthy. The text builder rejects
/// falsy queries.
pub fn is_truthy(value: &Bson) -> bool {
    match value {
        Bson::Null => false,
        Bson::Boolean(b) => *b,
        Bson::Int32(n) => *n != 0,
        Bson::Int64(n) => *n != 0,
        Bson::Double(n) => *n != 0.0,
        Bson::String(s) => !s.is_empty(),
        Bson::Array(items) => !items.is_empty(),
        Bson::Document(doc) => !doc.is_empty(),
        _ => true,
    }
}

/// Coerce a value destined for an identifier field into an ObjectId.
///
/// Hex strings are parsed, ObjectIds pass through, and arrays are coerced
/// element by element. Anything else cannot name an identifier.
pub fn cast_to_object_id(value: Bson) -> Result<Bson, TransformError> {
    match value {
        Bson::String(s) => parse_object_id(&s).map(Bson::ObjectId),
        Bson::ObjectId(_) => Ok(value),
        Bson::Array(items) => {
            let mut cast = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Bson::String(s) => cast.push(Bson::ObjectId(parse_object_id(&s)?)),
                    Bson::ObjectId(_) => cast.push(item),
                    other => {
                        return Err(TransformError::IdentifierCast(format!(
                            "wrong type `{}` for an identifier field",
                            ValueKind::of(&other).name()
                        )));
                    }
                }
            }
            Ok(Bson::Array(cast))
        }
        other => Err(TransformError::IdentifierCast(format!(
            "wrong type `{}` for an identifier field",
            ValueKind::of(&other).name()
        ))),
    }
}

fn parse_object_id(s: &str) -> Result<ObjectId, TransformError> {
    ObjectId::parse_str(s).map_err(|e| {
        TransformError::IdentifierCast(format!("`{}` is not a valid ObjectId: {}", s, e))
    })
}
