//! Deterministic guideline checks.
//!
//! Every structured [`Check`] is decided here without any model call.
//! `semantic` checks come back as [`RuleOutcome::NeedsJudgment`] and are
//! resolved by the runtime; the plain [`evaluate`] entry point refuses them.
//!
//! ## Outcome per check
//!
//! | Check | Violated when |
//! |-------|---------------|
//! | `require_pattern` | pattern never matches |
//! | `forbid_pattern` | pattern matches (first match quoted) |
//! | `min_words` / `max_words` | word count outside the bound |
//! | `require_citations` | fewer citations than `min` |
//! | `require_sections` | any listed heading absent |
//! | `no_placeholders` | TODO/TBD/lorem ipsum/... present |

pub mod patterns;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::guidelines::{Check, Guideline, GuidelineSet};

/// Errors from deterministic evaluation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvaluationError {
    #[error("Guideline '{guideline_id}' needs a language-model judgment")]
    JudgmentRequired { guideline_id: String },

    #[error("Guideline '{guideline_id}' has no compiled pattern")]
    UnknownPattern { guideline_id: String },
}

/// One violated guideline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Id of the violated guideline
    pub guideline_id: String,

    /// Why the content violates it (may be empty)
    pub explanation: String,

    /// Declaration index of the guideline in its set
    pub position: usize,
}

/// Result of evaluating content against a guideline set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "violations", rename_all = "snake_case")]
pub enum ComplianceResult {
    Compliant,

    /// Never empty; ordered by guideline declaration.
    Violations(Vec<Violation>),
}

impl ComplianceResult {
    /// Build a result from violations in any order.
    pub fn from_violations(mut violations: Vec<Violation>) -> Self {
        if violations.is_empty() {
            return Self::Compliant;
        }
        violations.sort_by_key(|v| v.position);
        Self::Violations(violations)
    }

    pub fn is_compliant(&self) -> bool {
        matches!(self, Self::Compliant)
    }

    pub fn violations(&self) -> &[Violation] {
        match self {
            Self::Compliant => &[],
            Self::Violations(v) => v,
        }
    }
}

/// Outcome of a single guideline check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleOutcome {
    Satisfied,
    Violated { explanation: String },
    /// Soft condition; a model must decide.
    NeedsJudgment { criterion: String },
}

/// A guideline together with its deterministic outcome.
#[derive(Debug, Clone)]
pub struct RuleFinding<'a> {
    pub position: usize,
    pub guideline: &'a Guideline,
    pub outcome: RuleOutcome,
}

/// Run every guideline's deterministic check, in declaration order.
pub fn evaluate_rules<'a>(
    content: &str,
    guidelines: &'a GuidelineSet,
) -> Result<Vec<RuleFinding<'a>>, EvaluationError> {
    guidelines
        .iter()
        .enumerate()
        .map(|(position, guideline)| {
            check_guideline(content, guideline, guidelines).map(|outcome| RuleFinding {
                position,
                guideline,
                outcome,
            })
        })
        .collect()
}

/// Evaluate content against guidelines without any model assistance.
///
/// Fails with [`EvaluationError::JudgmentRequired`] if a semantic guideline
/// is present.
pub fn evaluate(content: &str, guidelines: &GuidelineSet) -> Result<ComplianceResult, EvaluationError> {
    let mut violations = Vec::new();

    for finding in evaluate_rules(content, guidelines)? {
        match finding.outcome {
            RuleOutcome::Satisfied => {}
            RuleOutcome::Violated { explanation } => violations.push(Violation {
                guideline_id: finding.guideline.id.clone(),
                explanation,
                position: finding.position,
            }),
            RuleOutcome::NeedsJudgment { .. } => {
                return Err(EvaluationError::JudgmentRequired {
                    guideline_id: finding.guideline.id.clone(),
                })
            }
        }
    }

    Ok(ComplianceResult::from_violations(violations))
}

fn check_guideline(
    content: &str,
    guideline: &Guideline,
    guidelines: &GuidelineSet,
) -> Result<RuleOutcome, EvaluationError> {
    let outcome = match guideline.effective_check() {
        Check::RequirePattern { pattern } => {
            let regex = compiled(guideline, guidelines)?;
            if regex.is_match(content) {
                RuleOutcome::Satisfied
            } else {
                violated(format!("expected text matching `{}`", pattern))
            }
        }
        Check::ForbidPattern { .. } => {
            let regex = compiled(guideline, guidelines)?;
            match regex.find(content) {
                Some(m) => violated(format!("found \"{}\"", m.as_str())),
                None => RuleOutcome::Satisfied,
            }
        }
        Check::MinWords { count } => {
            let words = patterns::count_words(content);
            if words >= count {
                RuleOutcome::Satisfied
            } else {
                violated(format!("{} words, at least {} required", words, count))
            }
        }
        Check::MaxWords { count } => {
            let words = patterns::count_words(content);
            if words <= count {
                RuleOutcome::Satisfied
            } else {
                violated(format!("{} words, at most {} allowed", words, count))
            }
        }
        Check::RequireCitations { min } => {
            let found = patterns::count_citations(content);
            if found >= min {
                RuleOutcome::Satisfied
            } else {
                violated(format!("{} citations found, at least {} required", found, min))
            }
        }
        Check::RequireSections { headings } => {
            let present = patterns::headings(content);
            let missing: Vec<&str> = headings
                .iter()
                .filter(|h| !present.contains(&h.trim().to_lowercase()))
                .map(|h| h.as_str())
                .collect();
            if missing.is_empty() {
                RuleOutcome::Satisfied
            } else {
                violated(format!("missing section(s): {}", missing.join(", ")))
            }
        }
        Check::NoPlaceholders => match patterns::find_placeholder(content) {
            Some(placeholder) => violated(format!("placeholder \"{}\" left in text", placeholder)),
            None => RuleOutcome::Satisfied,
        },
        Check::Semantic { criterion } => RuleOutcome::NeedsJudgment { criterion },
    };

    Ok(outcome)
}

fn compiled<'a>(
    guideline: &Guideline,
    guidelines: &'a GuidelineSet,
) -> Result<&'a regex::Regex, EvaluationError> {
    guidelines
        .pattern(&guideline.id)
        .ok_or_else(|| EvaluationError::UnknownPattern {
            guideline_id: guideline.id.clone(),
        })
}

fn violated(explanation: String) -> RuleOutcome {
    RuleOutcome::Violated { explanation }
}
