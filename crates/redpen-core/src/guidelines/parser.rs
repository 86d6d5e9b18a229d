//! Guideline parsing from YAML/JSON.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use thiserror::Error;

use super::schema::validate_guidelines_schema;

/// Errors that can occur when loading guidelines.
#[derive(Error, Debug)]
pub enum GuidelineError {
    #[error("Failed to read guidelines file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Guidelines do not match schema: {}", .0.join("; "))]
    SchemaError(Vec<String>),

    #[error("Guidelines validation failed: {0}")]
    ValidationError(String),

    #[error("Invalid pattern in guideline '{id}': {source}")]
    InvalidPattern {
        id: String,
        #[source]
        source: regex::Error,
    },
}

/// Structured condition a guideline applies to draft content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Check {
    /// Regex that must match somewhere in the content
    RequirePattern { pattern: String },

    /// Regex that must not match anywhere in the content
    ForbidPattern { pattern: String },

    /// Lower bound on word count
    MinWords { count: usize },

    /// Upper bound on word count
    MaxWords { count: usize },

    /// Minimum number of citations (URLs, [n] markers, author-year)
    RequireCitations {
        #[serde(default = "default_min_citations")]
        min: usize,
    },

    /// Markdown headings that must be present
    RequireSections { headings: Vec<String> },

    /// No TODO/TBD/lorem ipsum left in the text
    NoPlaceholders,

    /// Soft condition that needs a language-model judgment
    Semantic { criterion: String },
}

fn default_min_citations() -> usize {
    1
}

impl Check {
    /// Whether this check can only be decided by a language model.
    pub fn is_semantic(&self) -> bool {
        matches!(self, Check::Semantic { .. })
    }
}

/// A named rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Guideline {
    /// Rule name, used verbatim in revision feedback (e.g., "cite sources")
    pub id: String,

    /// Human-readable statement of the rule
    #[serde(default)]
    pub description: String,

    /// Structured condition. A guideline without one is judged semantically
    /// against its description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check: Option<Check>,
}

impl Guideline {
    pub fn new(id: impl Into<String>, check: Check) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            check: Some(check),
        }
    }

    /// A natural-language guideline.
    pub fn described(id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            check: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// The condition actually evaluated.
    pub fn effective_check(&self) -> Check {
        match &self.check {
            Some(check) => check.clone(),
            None => Check::Semantic {
                criterion: self.description.clone(),
            },
        }
    }
}

/// On-disk guidelines document.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct GuidelineDocument {
    version: String,

    #[serde(default)]
    name: Option<String>,

    #[serde(default)]
    description: Option<String>,

    #[serde(default)]
    guidelines: Vec<Guideline>,
}

/// Ordered, validated, immutable set of guidelines.
///
/// Order is declaration order and determines feedback order.
#[derive(Debug, Clone)]
pub struct GuidelineSet {
    version: String,
    name: Option<String>,
    guidelines: Vec<Guideline>,
    patterns: HashMap<String, Regex>,
}

impl GuidelineSet {
    /// Build a set from guidelines in declaration order.
    pub fn new(guidelines: Vec<Guideline>) -> Result<Self, GuidelineError> {
        Self::build("1.0".to_string(), None, guidelines)
    }

    /// A set with no guidelines; every draft complies.
    pub fn empty() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            guidelines: Vec::new(),
            patterns: HashMap::new(),
        }
    }

    /// Parse guidelines from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, GuidelineError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse guidelines from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, GuidelineError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Load from a file, choosing the format by extension (`.json` or YAML).
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, GuidelineError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json(&contents),
            _ => Self::from_yaml(&contents),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, GuidelineError> {
        validate_guidelines_schema(&value).map_err(GuidelineError::SchemaError)?;
        let document: GuidelineDocument = serde_json::from_value(value)?;
        Self::build(document.version, document.name, document.guidelines)
    }

    fn build(
        version: String,
        name: Option<String>,
        guidelines: Vec<Guideline>,
    ) -> Result<Self, GuidelineError> {
        let mut seen = HashSet::new();
        let mut patterns = HashMap::new();

        for guideline in &guidelines {
            if guideline.id.trim().is_empty() {
                return Err(GuidelineError::ValidationError(
                    "Guideline id must not be empty".to_string(),
                ));
            }

            if guideline.id.chars().any(char::is_control) {
                return Err(GuidelineError::ValidationError(format!(
                    "Guideline id must be a single line: {:?}",
                    guideline.id
                )));
            }

            if !seen.insert(guideline.id.as_str()) {
                return Err(GuidelineError::ValidationError(format!(
                    "Duplicate guideline id: {}",
                    guideline.id
                )));
            }

            match &guideline.check {
                Some(Check::RequirePattern { pattern }) | Some(Check::ForbidPattern { pattern }) => {
                    let regex = Regex::new(pattern).map_err(|source| GuidelineError::InvalidPattern {
                        id: guideline.id.clone(),
                        source,
                    })?;
                    patterns.insert(guideline.id.clone(), regex);
                }
                Some(Check::MinWords { count: 0 })
                | Some(Check::MaxWords { count: 0 })
                | Some(Check::RequireCitations { min: 0 }) => {
                    return Err(GuidelineError::ValidationError(format!(
                        "Guideline '{}' needs a positive count",
                        guideline.id
                    )));
                }
                Some(Check::RequireSections { headings }) if headings.is_empty() => {
                    return Err(GuidelineError::ValidationError(format!(
                        "Guideline '{}' lists no headings",
                        guideline.id
                    )));
                }
                Some(Check::Semantic { criterion }) if criterion.trim().is_empty() => {
                    return Err(GuidelineError::ValidationError(format!(
                        "Guideline '{}' has an empty criterion",
                        guideline.id
                    )));
                }
                None if guideline.description.trim().is_empty() => {
                    return Err(GuidelineError::ValidationError(format!(
                        "Guideline '{}' needs a check or a description",
                        guideline.id
                    )));
                }
                _ => {}
            }
        }

        Ok(Self {
            version,
            name,
            guidelines,
            patterns,
        })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn len(&self) -> usize {
        self.guidelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guidelines.is_empty()
    }

    /// Guidelines in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Guideline> {
        self.guidelines.iter()
    }

    pub fn get(&self, id: &str) -> Option<&Guideline> {
        self.guidelines.iter().find(|g| g.id == id)
    }

    /// Compiled regex for a pattern guideline.
    pub fn pattern(&self, id: &str) -> Option<&Regex> {
        self.patterns.get(id)
    }

    /// Whether any guideline needs a language-model judgment.
    pub fn has_semantic(&self) -> bool {
        self.guidelines.iter().any(|g| g.effective_check().is_semantic())
    }
}

impl Default for GuidelineSet {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_GUIDELINES: &str = r#"
version: "1.0"
name: "Research report"
guidelines:
  - id: "cite sources"
    description: "Factual claims are backed by sources"
    check:
      kind: require_citations
      min: 1
  - id: "no hedging"
    check:
      kind: forbid_pattern
      pattern: "(?i)\\bmaybe\\b"
  - id: "plain language"
    description: "A non-specialist can follow the argument"
"#;

    #[test]
    fn test_parse_valid_guidelines() {
        let set = GuidelineSet::from_yaml(VALID_GUIDELINES).unwrap();
        assert_eq!(set.name(), Some("Research report"));
        assert_eq!(set.len(), 3);

        let ids: Vec<&str> = set.iter().map(|g| g.id.as_str()).collect();
        assert_eq!(ids, vec!["cite sources", "no hedging", "plain language"]);
        assert!(set.pattern("no hedging").is_some());
    }

    #[test]
    fn test_description_only_guideline_is_semantic() {
        let set = GuidelineSet::from_yaml(VALID_GUIDELINES).unwrap();
        let plain = set.get("plain language").unwrap();
        assert_eq!(
            plain.effective_check(),
            Check::Semantic {
                criterion: "A non-specialist can follow the argument".to_string()
            }
        );
        assert!(set.has_semantic());
    }

    #[test]
    fn test_citation_min_defaults_to_one() {
        let set = GuidelineSet::from_json(
            r#"{"version":"1.0","guidelines":[{"id":"cite","check":{"kind":"require_citations"}}]}"#,
        )
        .unwrap();
        assert_eq!(
            set.get("cite").unwrap().check,
            Some(Check::RequireCitations { min: 1 })
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let yaml = r#"
version: "1.0"
guidelines:
  - id: "cite sources"
    check: { kind: no_placeholders }
  - id: "cite sources"
    check: { kind: no_placeholders }
"#;
        let result = GuidelineSet::from_yaml(yaml);
        assert!(matches!(result, Err(GuidelineError::ValidationError(_))));
    }

    #[test]
    fn test_multiline_ids_rejected() {
        let yaml = "version: \"1.0\"\nguidelines:\n  - id: \"cite\\nsources\"\n    check: { kind: no_placeholders }\n";
        let result = GuidelineSet::from_yaml(yaml);
        assert!(matches!(result, Err(GuidelineError::SchemaError(_))));

        for id in ["cite\nsources", "cite\rsources", "tab\there"] {
            let result = GuidelineSet::new(vec![Guideline::new(id, Check::NoPlaceholders)]);
            assert!(
                matches!(result, Err(GuidelineError::ValidationError(_))),
                "{:?} should be rejected",
                id
            );
        }
    }

    #[test]
    fn test_invalid_regex_rejected() {
        let yaml = r#"
version: "1.0"
guidelines:
  - id: "broken"
    check:
      kind: require_pattern
      pattern: "(unclosed"
"#;
        let result = GuidelineSet::from_yaml(yaml);
        assert!(matches!(result, Err(GuidelineError::InvalidPattern { .. })));
    }

    #[test]
    fn test_schema_violation_reported() {
        let yaml = r#"
version: "1.0"
guidelines:
  - id: "tone"
    check:
      kind: semantic
"#;
        let result = GuidelineSet::from_yaml(yaml);
        assert!(matches!(result, Err(GuidelineError::SchemaError(_))));
    }

    #[test]
    fn test_programmatic_set_validates() {
        assert!(GuidelineSet::new(vec![Guideline::new("short", Check::MaxWords { count: 0 })]).is_err());
        assert!(GuidelineSet::new(vec![Guideline::described("tone", "   ")]).is_err());

        let set = GuidelineSet::new(vec![
            Guideline::new("finished", Check::NoPlaceholders),
            Guideline::described("tone", "Objective tone"),
        ])
        .unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_empty_set() {
        let set = GuidelineSet::empty();
        assert!(set.is_empty());
        assert!(!set.has_semantic());
    }

    #[test]
    fn test_demo_guidelines_load() {
        let set = GuidelineSet::from_yaml(include_str!("../../../../demos/guidelines.yaml")).unwrap();
        assert_eq!(set.len(), 5);
        assert!(set.has_semantic());
        assert_eq!(set.get("cite sources").unwrap().check, Some(Check::RequireCitations { min: 2 }));
    }
}
