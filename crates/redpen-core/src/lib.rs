//! # redpen-core
//!
//! Deterministic building blocks of the redpen review loop.
//!
//! This crate answers, for one draft snapshot:
//! - Does it comply with the guidelines?
//! - If not, what exactly must change?
//! - What has been decided about this draft so far?
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same content and guidelines always produce the same result
//! 2. **No LLM calls**: Semantic guidelines are reported, never guessed
//! 3. **Ordered**: Feedback follows guideline declaration order, one line per violation
//! 4. **Append-only history**: Verdicts are recorded before they are acted upon
//!
//! ## Example
//!
//! ```rust,ignore
//! use redpen_core::{evaluate, verdict_for, DraftState, GuidelineSet, ReviewVerdict};
//!
//! let guidelines = GuidelineSet::from_path("guidelines.yaml")?;
//! let mut draft = DraftState::new("Rates fell last year.", true);
//!
//! let result = evaluate(draft.content(), &guidelines)?;
//! let verdict = verdict_for(&result);
//! draft.record_verdict(verdict.clone());
//!
//! match verdict {
//!     ReviewVerdict::Accepted => println!("accepted"),
//!     ReviewVerdict::NeedsRevision { feedback } => println!("revise:\n{}", feedback),
//! }
//! ```

pub mod draft;
pub mod feedback;
pub mod guidelines;
pub mod policy;
pub mod verdict;

// Re-export main types at crate root
pub use draft::{DraftState, HistoryEntry};
pub use feedback::{compose_feedback, feedback_line, verdict_for};
pub use guidelines::{Check, Guideline, GuidelineError, GuidelineSet};
pub use policy::{
    evaluate, evaluate_rules, ComplianceResult, EvaluationError, RuleFinding, RuleOutcome,
    Violation,
};
pub use verdict::{EmptyFeedback, Feedback, ReviewVerdict};
