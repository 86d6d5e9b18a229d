//! Scripted agents and policies for exercising the workflow without a model.
//!
//! Used by this crate's tests and available to downstream crates that want
//! to drive [`WorkflowOrchestrator`](crate::orchestrator::WorkflowOrchestrator)
//! deterministically.

use async_trait::async_trait;
use parking_lot::Mutex;
use redpen_core::{ComplianceResult, DraftState, Feedback, GuidelineSet, ReviewVerdict, Violation};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::agents::{AgentError, Researcher, Revision, Writer};
use crate::policy::{GuidelinesPolicy, PolicyError};
use crate::providers::ProviderError;
use crate::reviewer::{ReviewError, ReviewOutput, Reviewer};

/// Shorthand for a [`Violation`].
pub fn violation(guideline_id: &str, explanation: &str, position: usize) -> Violation {
    Violation {
        guideline_id: guideline_id.to_string(),
        explanation: explanation.to_string(),
        position,
    }
}

/// Pops queued results, repeating the last one once the queue is down to it.
fn next_repeating<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut queue = queue.lock();
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

/// Policy returning queued results in order.
pub struct ScriptedPolicy {
    results: Mutex<VecDeque<Result<ComplianceResult, PolicyError>>>,
    calls: AtomicUsize,
}

impl ScriptedPolicy {
    pub fn new(results: Vec<Result<ComplianceResult, PolicyError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn compliant() -> Self {
        Self::new(vec![Ok(ComplianceResult::Compliant)])
    }

    /// Always reports the given `(guideline id, explanation)` violations.
    pub fn violating(violations: &[(&str, &str)]) -> Self {
        let violations = violations
            .iter()
            .enumerate()
            .map(|(i, (id, explanation))| violation(id, explanation, i))
            .collect();
        Self::new(vec![Ok(ComplianceResult::from_violations(violations))])
    }

    /// Always fails as if the judge provider were down.
    pub fn failing() -> Self {
        Self::new(vec![Err(PolicyError::Provider {
            guideline_id: "scripted".to_string(),
            source: ProviderError::HttpError("connection refused".to_string()),
        })])
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GuidelinesPolicy for ScriptedPolicy {
    async fn evaluate(
        &self,
        _content: &str,
        _guidelines: &GuidelineSet,
    ) -> Result<ComplianceResult, PolicyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        next_repeating(&self.results).unwrap_or_else(|| Ok(ComplianceResult::Compliant))
    }
}

/// Reviewer that asks for a revision on every pass.
pub struct AlwaysReviseReviewer {
    feedback: Feedback,
    calls: AtomicUsize,
}

impl AlwaysReviseReviewer {
    pub fn new(feedback: Feedback) -> Self {
        Self {
            feedback,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Reviewer for AlwaysReviseReviewer {
    async fn run(&self, draft: &mut DraftState) -> Result<ReviewOutput, ReviewError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let verdict = ReviewVerdict::needs_revision(self.feedback.clone());
        let output = ReviewOutput::from(&verdict);
        draft.record_verdict(verdict);
        Ok(output)
    }
}

/// Writer returning queued drafts: the first for `draft`, the rest for
/// successive revisions, repeating the last.
pub struct ScriptedWriter {
    contents: Mutex<VecDeque<String>>,
    feedback: Mutex<Vec<String>>,
    notes: Mutex<Vec<Option<String>>>,
    revisions: AtomicUsize,
    revision_notes: Option<String>,
    delay: Option<Duration>,
    cancel_on_revise: Option<CancellationToken>,
}

impl ScriptedWriter {
    pub fn new<I, S>(contents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            contents: Mutex::new(contents.into_iter().map(Into::into).collect()),
            feedback: Mutex::new(Vec::new()),
            notes: Mutex::new(Vec::new()),
            revisions: AtomicUsize::new(0),
            revision_notes: None,
            delay: None,
            cancel_on_revise: None,
        }
    }

    /// Sleep before every reply.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Attach `notes` to every revision.
    pub fn with_revision_notes(mut self, notes: impl Into<String>) -> Self {
        self.revision_notes = Some(notes.into());
        self
    }

    /// Cancel `token` while producing each revision, before returning it.
    pub fn cancel_on_revise(mut self, token: CancellationToken) -> Self {
        self.cancel_on_revise = Some(token);
        self
    }

    /// Number of revisions requested.
    pub fn revisions(&self) -> usize {
        self.revisions.load(Ordering::SeqCst)
    }

    /// Feedback passed to each revision, in order.
    pub fn feedback_received(&self) -> Vec<String> {
        self.feedback.lock().clone()
    }

    /// Research notes passed to each first draft.
    pub fn notes_received(&self) -> Vec<Option<String>> {
        self.notes.lock().clone()
    }

    async fn next(&self) -> Result<String, AgentError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        next_repeating(&self.contents).ok_or_else(|| AgentError::Internal("script is empty".to_string()))
    }
}

#[async_trait]
impl Writer for ScriptedWriter {
    fn name(&self) -> &str {
        "scripted-writer"
    }

    async fn draft(&self, _brief: &str, notes: Option<&str>) -> Result<String, AgentError> {
        self.notes.lock().push(notes.map(str::to_string));
        self.next().await
    }

    async fn revise(&self, _brief: &str, _content: &str, feedback: &Feedback) -> Result<Revision, AgentError> {
        self.revisions.fetch_add(1, Ordering::SeqCst);
        self.feedback.lock().push(feedback.as_str().to_string());
        if let Some(token) = &self.cancel_on_revise {
            token.cancel();
        }
        let content = self.next().await?;
        Ok(Revision {
            content,
            notes: self.revision_notes.clone(),
        })
    }
}

/// Researcher returning fixed notes.
pub struct ScriptedResearcher {
    notes: Result<String, AgentError>,
    calls: AtomicUsize,
}

impl ScriptedResearcher {
    pub fn new(notes: impl Into<String>) -> Self {
        Self {
            notes: Ok(notes.into()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: AgentError) -> Self {
        Self {
            notes: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Researcher for ScriptedResearcher {
    fn name(&self) -> &str {
        "scripted-research"
    }

    async fn research(&self, _brief: &str) -> Result<String, AgentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.notes.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_writer_repeats_last() {
        let writer = ScriptedWriter::new(["a", "b"]);
        let feedback = Feedback::new("Missing: x").unwrap();

        assert_eq!(writer.draft("brief", None).await.unwrap(), "a");
        assert_eq!(writer.revise("brief", "a", &feedback).await.unwrap(), Revision::new("b"));
        assert_eq!(writer.revise("brief", "b", &feedback).await.unwrap(), Revision::new("b"));
        assert_eq!(writer.revisions(), 2);
        assert_eq!(writer.feedback_received().len(), 2);
    }

    #[tokio::test]
    async fn test_scripted_policy_sequence() {
        let policy = ScriptedPolicy::new(vec![
            Ok(ComplianceResult::from_violations(vec![violation("a", "", 0)])),
            Ok(ComplianceResult::Compliant),
        ]);
        let guidelines = GuidelineSet::empty();

        assert!(!policy.evaluate("x", &guidelines).await.unwrap().is_compliant());
        assert!(policy.evaluate("x", &guidelines).await.unwrap().is_compliant());
        assert!(policy.evaluate("x", &guidelines).await.unwrap().is_compliant());
        assert_eq!(policy.calls(), 3);
    }
}
