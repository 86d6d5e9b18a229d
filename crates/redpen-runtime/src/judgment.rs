//! Semantic judgment parsing.
//!
//! The judge answers with one JSON object. Anything else is rejected rather
//! than interpreted: a reply we cannot read is an error, never a pass.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A model's judgment on one semantic guideline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Judgment {
    pub satisfied: bool,

    pub explanation: String,

    /// Supporting text copied from the draft
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quote: Option<String>,
}

/// Why a judgment was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JudgmentError {
    #[error("judgment is not a JSON object: {0}")]
    NotJson(String),

    #[error("judgment quote does not appear in the draft: \"{quote}\"")]
    QuoteNotFound { quote: String },

    #[error("unsatisfied judgment has no explanation")]
    MissingExplanation,
}

/// Parse a raw judge reply and check it against the draft.
pub fn parse_judgment(raw: &str, content: &str) -> Result<Judgment, JudgmentError> {
    let judgment: Judgment =
        serde_json::from_str(raw.trim()).map_err(|e| JudgmentError::NotJson(e.to_string()))?;

    if let Some(quote) = judgment.quote.as_deref().filter(|q| !q.trim().is_empty()) {
        if !normalize_whitespace(content).contains(&normalize_whitespace(quote)) {
            return Err(JudgmentError::QuoteNotFound {
                quote: quote.to_string(),
            });
        }
    }

    if !judgment.satisfied && judgment.explanation.trim().is_empty() {
        return Err(JudgmentError::MissingExplanation);
    }

    Ok(judgment)
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}
