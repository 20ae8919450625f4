pub mod error;
pub mod index;
pub mod lookup;
pub mod operator;
pub mod output;
pub mod transform;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::TransformError;
pub use index::{PathType, SearchIndex};
pub use lookup::{classify, KeywordCategory, Lookup, Lookups, Operation};
pub use operator::{CompoundClauses, MatchStage, RangeBound, SearchOperator, TextPath};
pub use output::{to_json, to_json_pretty};
pub use transform::{CompiledLookups, Transform};
pub use value::ValueKind;
