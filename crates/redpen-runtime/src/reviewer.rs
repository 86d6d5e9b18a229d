//! Reviewer agent.
//!
//! Judges the current draft against its guideline set and reports back in
//! the two-valued wire form the orchestrator consumes:
//!
//! ```json
//! {"review": null}
//! {"review": "Missing: cite sources (0 citations found, at least 1 required)"}
//! ```
//!
//! `null` means accept. Feedback is never empty.

use async_trait::async_trait;
use redpen_core::{verdict_for, DraftState, EmptyFeedback, Feedback, GuidelineSet, ReviewVerdict};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::policy::{GuidelinesPolicy, PolicyError};

/// Errors from a review.
#[derive(Error, Debug, Clone)]
pub enum ReviewError {
    #[error("Guideline evaluation failed: {0}")]
    EvaluationFailed(#[from] PolicyError),
}

/// The reviewer's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewOutput {
    /// `None` accepts the draft; otherwise revision feedback
    pub review: Option<String>,
}

impl ReviewOutput {
    pub fn accept() -> Self {
        Self { review: None }
    }

    pub fn revise(feedback: &Feedback) -> Self {
        Self {
            review: Some(feedback.as_str().to_string()),
        }
    }

    pub fn is_accept(&self) -> bool {
        self.review.is_none()
    }

    /// Back to a typed verdict. Empty feedback is not a valid reply.
    pub fn into_verdict(self) -> Result<ReviewVerdict, EmptyFeedback> {
        match self.review {
            None => Ok(ReviewVerdict::Accepted),
            Some(text) => Feedback::new(text).map(ReviewVerdict::needs_revision),
        }
    }
}

impl From<&ReviewVerdict> for ReviewOutput {
    fn from(verdict: &ReviewVerdict) -> Self {
        match verdict {
            ReviewVerdict::Accepted => Self::accept(),
            ReviewVerdict::NeedsRevision { feedback } => Self::revise(feedback),
        }
    }
}

/// Something that reviews drafts.
///
/// Takes the draft mutably for the duration of one review, so a draft can
/// never have two reviews in flight.
#[async_trait]
pub trait Reviewer: Send + Sync {
    /// Review the draft, appending the verdict to its history unless review
    /// is disabled for it.
    async fn run(&self, draft: &mut DraftState) -> Result<ReviewOutput, ReviewError>;
}

/// Reviewer backed by a [`GuidelinesPolicy`] and one guideline set.
#[derive(Clone)]
pub struct ReviewerAgent {
    policy: Arc<dyn GuidelinesPolicy>,
    guidelines: Arc<GuidelineSet>,
}

impl ReviewerAgent {
    pub fn new(policy: Arc<dyn GuidelinesPolicy>, guidelines: Arc<GuidelineSet>) -> Self {
        Self { policy, guidelines }
    }

    pub fn guidelines(&self) -> &GuidelineSet {
        &self.guidelines
    }

    /// Decide on the draft without recording anything.
    pub async fn review_draft(&self, draft: &DraftState) -> Result<ReviewVerdict, ReviewError> {
        let result = self
            .policy
            .evaluate_revision(draft.content(), draft.revision_notes(), &self.guidelines)
            .await?;
        Ok(verdict_for(&result))
    }
}

#[async_trait]
impl Reviewer for ReviewerAgent {
    async fn run(&self, draft: &mut DraftState) -> Result<ReviewOutput, ReviewError> {
        if !draft.guidelines_enabled() {
            debug!(revision = draft.revision_count(), "Guidelines disabled, skipping review");
            return Ok(ReviewOutput::accept());
        }

        let verdict = self.review_draft(draft).await?;
        let output = ReviewOutput::from(&verdict);

        debug!(
            revision = draft.revision_count(),
            guidelines = self.guidelines.len(),
            feedback_lines = verdict.feedback().map_or(0, Feedback::line_count),
            "Draft reviewed"
        );
        draft.record_verdict(verdict);

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::GuidelineEvaluator;
    use crate::testing::{violation, ScriptedPolicy};
    use redpen_core::{Check, ComplianceResult, Guideline};

    fn agent(policy: Arc<dyn GuidelinesPolicy>) -> ReviewerAgent {
        ReviewerAgent::new(policy, Arc::new(GuidelineSet::empty()))
    }

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&ReviewOutput::accept()).unwrap(),
            r#"{"review":null}"#
        );
        let feedback = Feedback::new("Missing: cite sources").unwrap();
        assert_eq!(
            serde_json::to_string(&ReviewOutput::revise(&feedback)).unwrap(),
            r#"{"review":"Missing: cite sources"}"#
        );
    }

    #[test]
    fn test_into_verdict() {
        assert_eq!(ReviewOutput::accept().into_verdict(), Ok(ReviewVerdict::Accepted));
        assert!(ReviewOutput { review: Some(String::new()) }.into_verdict().is_err());

        let verdict = ReviewOutput {
            review: Some("Missing: tone".to_string()),
        }
        .into_verdict()
        .unwrap();
        assert_eq!(verdict.feedback().unwrap().as_str(), "Missing: tone");
    }

    #[tokio::test]
    async fn test_accept_on_first_pass() {
        let policy = Arc::new(ScriptedPolicy::compliant());
        let mut draft = DraftState::new("well-formed draft", true);

        let output = agent(policy.clone()).run(&mut draft).await.unwrap();

        assert_eq!(output, ReviewOutput::accept());
        assert_eq!(draft.history().len(), 1);
        assert_eq!(draft.last_verdict(), Some(&ReviewVerdict::Accepted));
        assert_eq!(policy.calls(), 1);
    }

    #[tokio::test]
    async fn test_disabled_guidelines_skip_policy() {
        let policy = Arc::new(ScriptedPolicy::violating(&[("cite sources", "")]));
        let mut draft = DraftState::new("anything at all", false);

        let output = agent(policy.clone()).run(&mut draft).await.unwrap();

        assert!(output.is_accept());
        assert!(draft.history().is_empty());
        assert_eq!(policy.calls(), 0);
    }

    #[tokio::test]
    async fn test_violations_become_feedback_lines() {
        let policy = Arc::new(ScriptedPolicy::new(vec![Ok(ComplianceResult::from_violations(vec![
            violation("no placeholders", "placeholder \"TBD\" left in text", 1),
            violation("cite sources", "", 0),
        ]))]));
        let mut draft = DraftState::new("Draft TBD", true);

        let output = agent(policy).run(&mut draft).await.unwrap();

        assert_eq!(
            output.review.as_deref(),
            Some("Missing: cite sources\nMissing: no placeholders (placeholder \"TBD\" left in text)")
        );
        assert!(!draft.last_verdict().unwrap().is_accepted());
    }

    #[tokio::test]
    async fn test_policy_failure_leaves_history_untouched() {
        let policy = Arc::new(ScriptedPolicy::failing());
        let mut draft = DraftState::new("draft", true);

        let err = agent(policy).run(&mut draft).await.unwrap_err();

        assert!(matches!(err, ReviewError::EvaluationFailed(_)));
        assert!(draft.history().is_empty());
    }

    #[tokio::test]
    async fn test_real_evaluator_end_to_end() {
        let guidelines = GuidelineSet::new(vec![Guideline::new(
            "cite sources",
            Check::RequireCitations { min: 1 },
        )])
        .unwrap();
        let reviewer = ReviewerAgent::new(Arc::new(GuidelineEvaluator::deterministic()), Arc::new(guidelines));
        let mut draft = DraftState::new("Rates fell (Smith, 2021).", true);

        assert!(reviewer.run(&mut draft).await.unwrap().is_accept());
    }
}
