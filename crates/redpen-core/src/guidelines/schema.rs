//! JSON Schema validation for guideline documents.
//!
//! Documents are validated against `schema/guidelines.schema.json` before
//! they are deserialized, so structural mistakes are reported with their
//! JSON pointer instead of a serde message.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded guidelines schema (loaded at compile time).
const GUIDELINES_SCHEMA_JSON: &str = include_str!("../../../../schema/guidelines.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema loading.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load schema: {0}")]
    LoadError(String),
}

fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(GUIDELINES_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a guidelines document against the schema.
///
/// Returns every validation error, each suffixed with its instance path.
pub fn validate_guidelines_schema(document: &serde_json::Value) -> Result<(), Vec<String>> {
    let validator = get_validator().map_err(|e| vec![e.to_string()])?;

    let errors: Vec<String> = validator
        .iter_errors(document)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_document_passes() {
        let value = serde_json::json!({
            "version": "1.0",
            "guidelines": []
        });
        assert!(validate_guidelines_schema(&value).is_ok());
    }

    #[test]
    fn test_missing_version_fails() {
        let value = serde_json::json!({ "guidelines": [] });
        assert!(validate_guidelines_schema(&value).is_err());
    }

    #[test]
    fn test_bad_version_format_fails() {
        let value = serde_json::json!({ "version": "one", "guidelines": [] });
        assert!(validate_guidelines_schema(&value).is_err());
    }

    #[test]
    fn test_unknown_check_kind_fails() {
        let value = serde_json::json!({
            "version": "1.0",
            "guidelines": [
                { "id": "cite sources", "check": { "kind": "vibes" } }
            ]
        });
        assert!(validate_guidelines_schema(&value).is_err());
    }

    #[test]
    fn test_zero_word_count_fails() {
        let value = serde_json::json!({
            "version": "1.0",
            "guidelines": [
                { "id": "length", "check": { "kind": "min_words", "count": 0 } }
            ]
        });
        assert!(validate_guidelines_schema(&value).is_err());
    }

    #[test]
    fn test_additional_properties_fail() {
        let value = serde_json::json!({
            "version": "1.0",
            "guidelines": [],
            "owner": "someone"
        });
        assert!(validate_guidelines_schema(&value).is_err());
    }

    #[test]
    fn test_full_document_passes() {
        let value = serde_json::json!({
            "version": "1.2.0",
            "name": "Research report",
            "description": "House style for published reports",
            "guidelines": [
                { "id": "cite sources", "description": "Back claims with sources",
                  "check": { "kind": "require_citations", "min": 2 } },
                { "id": "no hedging", "check": { "kind": "forbid_pattern", "pattern": "(?i)\\bmaybe\\b" } },
                { "id": "has summary", "check": { "kind": "require_sections", "headings": ["Summary"] } },
                { "id": "finished", "check": { "kind": "no_placeholders" } },
                { "id": "length", "check": { "kind": "max_words", "count": 1500 } },
                { "id": "objective tone", "check": { "kind": "semantic", "criterion": "The tone is objective" } },
                { "id": "audience", "description": "Readable by a non-specialist" }
            ]
        });
        assert!(validate_guidelines_schema(&value).is_ok());
    }
}
