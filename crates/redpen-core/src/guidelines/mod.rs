//! Guideline loading and validation.
//!
//! Guidelines are an ordered set of named rules supplied at the start of a
//! workflow run. Documents are YAML or JSON, checked against the embedded
//! JSON Schema and then validated (unique ids, compilable patterns).

mod parser;
mod schema;

pub use parser::{Check, Guideline, GuidelineError, GuidelineSet};
pub use schema::validate_guidelines_schema;
