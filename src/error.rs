use std::fmt;

/// Errors produced while compiling lookups into search operators.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformError {
    /// The lookup used a recognized keyword this compiler does not implement,
    /// or combined keywords in an unsupported way.
    UnsupportedOperator(String),
    /// The value attached to a lookup cannot be used with its operator.
    InvalidFieldValue(String),
    /// A path (or one of its prefixes) is not covered by the search index.
    IndexField(String),
    /// A value destined for an identifier field could not be cast to an
    /// ObjectId.
    IdentifierCast(String),
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformError::UnsupportedOperator(msg) => {
                write!(f, "Unsupported operator: {}", msg)
            }
            TransformError::InvalidFieldValue(msg) => {
                write!(f, "Invalid field value: {}", msg)
            }
            TransformError::IndexField(msg) => write!(f, "Index field error: {}", msg),
            TransformError::IdentifierCast(msg) => write!(f, "Identifier cast error: {}", msg),
        }
    }
}

impl std::error::Error for TransformError {}
