//! Workflow orchestrator for the draft/review/revise loop.
//!
//! ```text
//! Drafting -> Reviewing -> Accepted
//!    ^            |
//!    |            v
//!    +-------- Revising
//! (any stage) -> Aborted
//! ```
//!
//! An applied revision is a new draft, so the trace of a run with one
//! revision reads:
//!
//! ```text
//! [Drafting, Reviewing, Revising, Drafting, Reviewing, Accepted]
//! ```
//!
//! The orchestrator owns the [`DraftState`] for the whole run and lends it
//! to one agent at a time. Each run is a single sequential task; independent
//! runs may execute concurrently on a shared orchestrator.
//!
//! Every run ends in an outcome: failures are reported as
//! [`AbortReason`]s, never as an implicit acceptance.

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use redpen_core::{DraftState, GuidelineSet, HistoryEntry, ReviewVerdict};

use crate::agents::{AgentError, ResearchAgent, Researcher, Writer, WriterAgent};
use crate::cache::JudgmentCache;
use crate::config::RuntimeConfig;
use crate::policy::{GuidelineEvaluator, GuidelinesPolicy};
use crate::providers::LanguageModelProvider;
use crate::resilience::{CircuitBreaker, ResilientCaller};
use crate::reviewer::{ReviewError, Reviewer, ReviewerAgent};

/// Errors assembling an orchestrator.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("No writer configured: set a writer or a provider")]
    WriterNotConfigured,

    #[error("Invalid configuration: {0}")]
    Config(#[from] crate::config::ConfigError),
}

/// Stage of a workflow run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Drafting,
    Reviewing,
    Revising,
    Accepted,
    Aborted,
}

impl WorkflowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Aborted)
    }
}

/// Why a run was aborted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum AbortReason {
    /// The guidelines could not be evaluated
    EvaluationFailed { message: String },

    /// A revision was requested after `limit` revisions were applied
    MaxRevisionsExceeded { limit: u32 },

    /// The run was cancelled
    Cancelled,

    /// Drafting produced unusable content
    MalformedDraft { detail: String },

    /// A drafting agent failed
    DraftingFailed { agent: String, message: String },
}

/// How the run ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum WorkflowStatus {
    Accepted,
    Aborted { reason: AbortReason },
}

/// What an acceptance rests on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcceptanceBasis {
    /// The reviewer evaluated the draft and found it compliant
    Reviewed,
    /// Guidelines were disabled; the draft was accepted unreviewed
    ReviewSkipped,
}

/// Final result of a workflow run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    #[serde(flatten)]
    pub status: WorkflowStatus,

    /// Content at the end of the run
    pub content: String,

    /// Revisions applied
    pub revision_count: u32,

    /// Every verdict recorded, oldest first
    pub history: Vec<HistoryEntry>,

    /// States visited, in order
    pub trace: Vec<WorkflowState>,

    /// Set only when accepted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_basis: Option<AcceptanceBasis>,
}

impl WorkflowOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self.status, WorkflowStatus::Accepted)
    }

    pub fn abort_reason(&self) -> Option<&AbortReason> {
        match &self.status {
            WorkflowStatus::Accepted => None,
            WorkflowStatus::Aborted { reason } => Some(reason),
        }
    }
}

/// Input for one run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// What the report is about
    pub brief: String,

    /// Existing draft; skips research and first drafting when set
    #[serde(default)]
    pub initial_content: Option<String>,
}

impl WorkflowRequest {
    pub fn new(brief: impl Into<String>) -> Self {
        Self {
            brief: brief.into(),
            initial_content: None,
        }
    }

    pub fn with_initial_content(mut self, content: impl Into<String>) -> Self {
        self.initial_content = Some(content.into());
        self
    }
}

static RUN_IDS: AtomicU64 = AtomicU64::new(1);

/// Drives drafts through review and revision until accepted or aborted.
pub struct WorkflowOrchestrator {
    config: RuntimeConfig,
    reviewer: Arc<dyn Reviewer>,
    writer: Arc<dyn Writer>,
    researcher: Option<Arc<dyn Researcher>>,
}

impl WorkflowOrchestrator {
    pub fn builder() -> WorkflowOrchestratorBuilder {
        WorkflowOrchestratorBuilder::new()
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Run the whole workflow for `request`.
    pub async fn run(&self, request: WorkflowRequest, cancel: CancellationToken) -> WorkflowOutcome {
        let run_id = RUN_IDS.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("workflow", run = run_id);

        async move {
            let run = Run::new();
            info!(
                max_revisions = self.config.max_revisions,
                guidelines_enabled = self.config.guidelines_enabled,
                "Workflow started"
            );

            let content = match self.initial_draft(&request, &cancel).await {
                Ok(content) => content,
                Err(reason) => return run.abort(&DraftState::new("", self.config.guidelines_enabled), reason),
            };

            // Rejected content is still reported in the outcome.
            let draft = DraftState::new(content, self.config.guidelines_enabled);
            if let Err(reason) = self.check_content(draft.content()) {
                return run.abort(&draft, reason);
            }
            self.review_loop(run, draft, &request.brief, &cancel).await
        }
        .instrument(span)
        .await
    }

    /// Run the review loop on an existing draft, skipping drafting.
    pub async fn run_draft(
        &self,
        draft: DraftState,
        brief: &str,
        cancel: CancellationToken,
    ) -> WorkflowOutcome {
        let run_id = RUN_IDS.fetch_add(1, Ordering::Relaxed);
        let span = info_span!("workflow", run = run_id);

        async move {
            let run = Run::new();
            if let Err(reason) = self.check_content(draft.content()) {
                return run.abort(&draft, reason);
            }
            self.review_loop(run, draft, brief, &cancel).await
        }
        .instrument(span)
        .await
    }

    async fn initial_draft(
        &self,
        request: &WorkflowRequest,
        cancel: &CancellationToken,
    ) -> Result<String, AbortReason> {
        if cancel.is_cancelled() {
            return Err(AbortReason::Cancelled);
        }

        let content = match &request.initial_content {
            Some(content) => content.clone(),
            None => {
                let notes = match &self.researcher {
                    Some(researcher) => {
                        let notes = until_cancelled(cancel, researcher.research(&request.brief))
                            .await
                            .ok_or(AbortReason::Cancelled)?
                            .map_err(|e| drafting_failed(researcher.name(), e))?;
                        Some(notes)
                    }
                    None => None,
                };

                until_cancelled(cancel, self.writer.draft(&request.brief, notes.as_deref()))
                    .await
                    .ok_or(AbortReason::Cancelled)?
                    .map_err(|e| drafting_failed(self.writer.name(), e))?
            }
        };

        Ok(content)
    }

    async fn review_loop(
        &self,
        mut run: Run,
        mut draft: DraftState,
        brief: &str,
        cancel: &CancellationToken,
    ) -> WorkflowOutcome {
        let limit = self.config.max_revisions;

        loop {
            if cancel.is_cancelled() {
                return run.abort(&draft, AbortReason::Cancelled);
            }

            run.enter(WorkflowState::Reviewing, &draft);
            let output = match until_cancelled(cancel, self.reviewer.run(&mut draft)).await {
                None => return run.abort(&draft, AbortReason::Cancelled),
                Some(Err(ReviewError::EvaluationFailed(e))) => {
                    warn!(error = %e, "Review failed");
                    return run.abort(
                        &draft,
                        AbortReason::EvaluationFailed {
                            message: e.to_string(),
                        },
                    );
                }
                Some(Ok(output)) => output,
            };

            let feedback = match output.into_verdict() {
                Ok(ReviewVerdict::Accepted) => {
                    let basis = if draft.guidelines_enabled() {
                        AcceptanceBasis::Reviewed
                    } else {
                        AcceptanceBasis::ReviewSkipped
                    };
                    return run.accept(&draft, basis);
                }
                Ok(ReviewVerdict::NeedsRevision { feedback }) => feedback,
                Err(e) => {
                    return run.abort(
                        &draft,
                        AbortReason::EvaluationFailed {
                            message: e.to_string(),
                        },
                    )
                }
            };

            if draft.revision_count() >= limit {
                return run.abort(&draft, AbortReason::MaxRevisionsExceeded { limit });
            }

            run.enter(WorkflowState::Revising, &draft);
            let revised = match until_cancelled(cancel, self.writer.revise(brief, draft.content(), &feedback)).await {
                None => return run.abort(&draft, AbortReason::Cancelled),
                Some(Err(e)) => return run.abort(&draft, drafting_failed(self.writer.name(), e)),
                Some(Ok(revised)) => revised,
            };

            if let Err(reason) = self.check_content(&revised.content) {
                return run.abort(&draft, reason);
            }

            // A revision finished after cancellation is dropped unapplied.
            if cancel.is_cancelled() {
                return run.abort(&draft, AbortReason::Cancelled);
            }

            draft.revise_with_notes(revised.content, revised.notes);
            debug!(
                revision = draft.revision_count(),
                notes = draft.revision_notes().is_some(),
                "Revision applied"
            );
            run.enter(WorkflowState::Drafting, &draft);
        }
    }

    fn check_content(&self, content: &str) -> Result<(), AbortReason> {
        if content.trim().is_empty() {
            return Err(AbortReason::MalformedDraft {
                detail: "draft is empty".to_string(),
            });
        }

        let chars = content.chars().count();
        if chars > self.config.max_content_chars {
            return Err(AbortReason::MalformedDraft {
                detail: format!(
                    "draft has {} characters, limit is {}",
                    chars, self.config.max_content_chars
                ),
            });
        }

        Ok(())
    }
}

/// Await `fut` unless `cancel` fires first.
async fn until_cancelled<F: Future>(cancel: &CancellationToken, fut: F) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => None,
        output = fut => Some(output),
    }
}

fn drafting_failed(agent: &str, error: AgentError) -> AbortReason {
    AbortReason::DraftingFailed {
        agent: agent.to_string(),
        message: error.to_string(),
    }
}

/// State trace of one run.
struct Run {
    trace: Vec<WorkflowState>,
}

impl Run {
    fn new() -> Self {
        Self {
            trace: vec![WorkflowState::Drafting],
        }
    }

    fn enter(&mut self, state: WorkflowState, draft: &DraftState) {
        info!(state = ?state, revision = draft.revision_count(), "Workflow transition");
        self.trace.push(state);
    }

    fn accept(mut self, draft: &DraftState, basis: AcceptanceBasis) -> WorkflowOutcome {
        self.trace.push(WorkflowState::Accepted);
        info!(
            revisions = draft.revision_count(),
            basis = ?basis,
            "Draft accepted"
        );
        self.finish(draft, WorkflowStatus::Accepted, Some(basis))
    }

    fn abort(mut self, draft: &DraftState, reason: AbortReason) -> WorkflowOutcome {
        self.trace.push(WorkflowState::Aborted);
        warn!(revisions = draft.revision_count(), reason = ?reason, "Workflow aborted");
        self.finish(draft, WorkflowStatus::Aborted { reason }, None)
    }

    fn finish(
        self,
        draft: &DraftState,
        status: WorkflowStatus,
        acceptance_basis: Option<AcceptanceBasis>,
    ) -> WorkflowOutcome {
        WorkflowOutcome {
            status,
            content: draft.content().to_string(),
            revision_count: draft.revision_count(),
            history: draft.history().to_vec(),
            trace: self.trace,
            acceptance_basis,
        }
    }
}

/// Builder for [`WorkflowOrchestrator`].
///
/// With a provider, any agent not set explicitly is built on top of it,
/// sharing one circuit breaker and judgment cache.
pub struct WorkflowOrchestratorBuilder {
    config: RuntimeConfig,
    provider: Option<Arc<dyn LanguageModelProvider>>,
    guidelines: Arc<GuidelineSet>,
    policy: Option<Arc<dyn GuidelinesPolicy>>,
    reviewer: Option<Arc<dyn Reviewer>>,
    writer: Option<Arc<dyn Writer>>,
    researcher: Option<Arc<dyn Researcher>>,
    research: bool,
}

impl WorkflowOrchestratorBuilder {
    pub fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            provider: None,
            guidelines: Arc::new(GuidelineSet::empty()),
            policy: None,
            reviewer: None,
            writer: None,
            researcher: None,
            research: true,
        }
    }

    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LanguageModelProvider>) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn guidelines(mut self, guidelines: Arc<GuidelineSet>) -> Self {
        self.guidelines = guidelines;
        self
    }

    /// Policy for the default reviewer.
    pub fn policy(mut self, policy: Arc<dyn GuidelinesPolicy>) -> Self {
        self.policy = Some(policy);
        self
    }

    pub fn reviewer(mut self, reviewer: Arc<dyn Reviewer>) -> Self {
        self.reviewer = Some(reviewer);
        self
    }

    pub fn writer(mut self, writer: Arc<dyn Writer>) -> Self {
        self.writer = Some(writer);
        self
    }

    pub fn researcher(mut self, researcher: Arc<dyn Researcher>) -> Self {
        self.researcher = Some(researcher);
        self
    }

    /// Draft straight from the brief without a research pass.
    pub fn without_research(mut self) -> Self {
        self.research = false;
        self
    }

    pub fn build(self) -> Result<WorkflowOrchestrator, OrchestratorError> {
        self.config.validate()?;

        let caller = self.provider.map(|provider| {
            ResilientCaller::new(
                provider,
                Arc::new(CircuitBreaker::new(self.config.circuit_breaker.clone())),
                self.config.retry.clone(),
                self.config.provider_timeout,
                self.config.completion.clone(),
            )
        });

        let reviewer: Arc<dyn Reviewer> = match self.reviewer {
            Some(reviewer) => reviewer,
            None => {
                let policy: Arc<dyn GuidelinesPolicy> = match (self.policy, &caller) {
                    (Some(policy), _) => policy,
                    (None, Some(caller)) => Arc::new(GuidelineEvaluator::with_judge(
                        caller.clone(),
                        JudgmentCache::new(&self.config.cache),
                    )),
                    (None, None) => Arc::new(GuidelineEvaluator::deterministic()),
                };
                Arc::new(ReviewerAgent::new(policy, self.guidelines))
            }
        };

        let writer: Arc<dyn Writer> = match (self.writer, &caller) {
            (Some(writer), _) => writer,
            (None, Some(caller)) => Arc::new(WriterAgent::new(caller.clone(), self.config.tone)),
            (None, None) => return Err(OrchestratorError::WriterNotConfigured),
        };

        let researcher: Option<Arc<dyn Researcher>> = match (self.researcher, &caller) {
            _ if !self.research => None,
            (Some(researcher), _) => Some(researcher),
            (None, Some(caller)) => Some(Arc::new(ResearchAgent::new(caller.clone()))),
            (None, None) => None,
        };

        Ok(WorkflowOrchestrator {
            config: self.config,
            reviewer,
            writer,
            researcher,
        })
    }
}

impl Default for WorkflowOrchestratorBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{DryRunProvider, FailingProvider};
    use crate::testing::{AlwaysReviseReviewer, ScriptedPolicy, ScriptedWriter};
    use redpen_core::{Check, Feedback, Guideline};

    fn config(max_revisions: u32) -> RuntimeConfig {
        RuntimeConfig {
            max_revisions,
            ..RuntimeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_accept_on_first_pass() {
        let writer = Arc::new(ScriptedWriter::new(["first draft"]));
        let orchestrator = WorkflowOrchestrator::builder()
            .config(config(3))
            .policy(Arc::new(ScriptedPolicy::compliant()))
            .writer(writer.clone())
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(WorkflowRequest::new("brief"), CancellationToken::new())
            .await;

        assert!(outcome.is_accepted());
        assert_eq!(outcome.content, "first draft");
        assert_eq!(outcome.revision_count, 0);
        assert_eq!(outcome.acceptance_basis, Some(AcceptanceBasis::Reviewed));
        assert_eq!(
            outcome.trace,
            vec![WorkflowState::Drafting, WorkflowState::Reviewing, WorkflowState::Accepted]
        );
        assert_eq!(writer.revisions(), 0);
        assert!(outcome.trace.iter().filter(|s| s.is_terminal()).count() == 1);
    }

    #[tokio::test]
    async fn test_one_revision_then_accept() {
        let guidelines = GuidelineSet::new(vec![Guideline::new(
            "cite sources",
            Check::RequireCitations { min: 1 },
        )])
        .unwrap();
        let writer = Arc::new(ScriptedWriter::new(["Rates fell.", "Rates fell [1]."]));
        let orchestrator = WorkflowOrchestrator::builder()
            .guidelines(Arc::new(guidelines))
            .writer(writer.clone())
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(WorkflowRequest::new("rates"), CancellationToken::new())
            .await;

        assert!(outcome.is_accepted());
        assert_eq!(outcome.content, "Rates fell [1].");
        assert_eq!(outcome.revision_count, 1);
        assert_eq!(outcome.history.len(), 2);
        assert_eq!(
            outcome.trace,
            vec![
                WorkflowState::Drafting,
                WorkflowState::Reviewing,
                WorkflowState::Revising,
                WorkflowState::Drafting,
                WorkflowState::Reviewing,
                WorkflowState::Accepted,
            ]
        );
        assert_eq!(
            writer.feedback_received(),
            vec!["Missing: cite sources (0 citations found, at least 1 required)".to_string()]
        );
    }

    #[tokio::test]
    async fn test_max_revisions_exceeded() {
        let orchestrator = WorkflowOrchestrator::builder()
            .config(config(2))
            .reviewer(Arc::new(AlwaysReviseReviewer::new(Feedback::new("Missing: tone").unwrap())))
            .writer(Arc::new(ScriptedWriter::new(["v0", "v1", "v2", "v3"])))
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(WorkflowRequest::new("brief"), CancellationToken::new())
            .await;

        assert_eq!(
            outcome.abort_reason(),
            Some(&AbortReason::MaxRevisionsExceeded { limit: 2 })
        );
        assert_eq!(outcome.revision_count, 2);
        assert_eq!(outcome.content, "v2");
        assert_eq!(outcome.history.len(), 3);
    }

    #[tokio::test]
    async fn test_disabled_guidelines_accept_unreviewed() {
        let policy = Arc::new(ScriptedPolicy::violating(&[("cite sources", "")]));
        let orchestrator = WorkflowOrchestrator::builder()
            .config(RuntimeConfig {
                guidelines_enabled: false,
                ..RuntimeConfig::default()
            })
            .policy(policy.clone())
            .writer(Arc::new(ScriptedWriter::new(["uncited draft"])))
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(WorkflowRequest::new("brief"), CancellationToken::new())
            .await;

        assert!(outcome.is_accepted());
        assert_eq!(outcome.acceptance_basis, Some(AcceptanceBasis::ReviewSkipped));
        assert!(outcome.history.is_empty());
        assert_eq!(policy.calls(), 0);
    }

    #[tokio::test]
    async fn test_blank_draft_is_malformed() {
        let orchestrator = WorkflowOrchestrator::builder()
            .writer(Arc::new(ScriptedWriter::new(["   \n"])))
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(WorkflowRequest::new("brief"), CancellationToken::new())
            .await;

        assert!(matches!(
            outcome.abort_reason(),
            Some(AbortReason::MalformedDraft { .. })
        ));
        assert_eq!(outcome.trace, vec![WorkflowState::Drafting, WorkflowState::Aborted]);
    }

    #[tokio::test]
    async fn test_oversized_initial_content_is_malformed() {
        let orchestrator = WorkflowOrchestrator::builder()
            .config(RuntimeConfig {
                max_content_chars: 10,
                ..RuntimeConfig::default()
            })
            .writer(Arc::new(ScriptedWriter::new(["unused"])))
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(
                WorkflowRequest::new("brief").with_initial_content("far more than ten characters"),
                CancellationToken::new(),
            )
            .await;

        match outcome.abort_reason() {
            Some(AbortReason::MalformedDraft { detail }) => assert!(detail.contains("limit is 10")),
            other => panic!("expected MalformedDraft, got {:?}", other),
        }
        assert_eq!(outcome.content, "far more than ten characters");
        assert_eq!(outcome.revision_count, 0);
    }

    #[tokio::test]
    async fn test_provider_failure_aborts_drafting() {
        let orchestrator = WorkflowOrchestrator::builder()
            .config(RuntimeConfig {
                retry: crate::resilience::RetryConfig::none(),
                ..RuntimeConfig::default()
            })
            .provider(Arc::new(FailingProvider::unavailable()))
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(WorkflowRequest::new("brief"), CancellationToken::new())
            .await;

        match outcome.abort_reason() {
            Some(AbortReason::DraftingFailed { agent, .. }) => assert_eq!(agent, "research"),
            other => panic!("expected DraftingFailed, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dry_run_provider_end_to_end() {
        let guidelines = GuidelineSet::new(vec![
            Guideline::new("cite sources", Check::RequireCitations { min: 2 }),
            Guideline::new("finished", Check::NoPlaceholders),
            Guideline::described("relevant", "stays on the topic of the brief"),
        ])
        .unwrap();
        let orchestrator = WorkflowOrchestrator::builder()
            .provider(Arc::new(DryRunProvider::new()))
            .guidelines(Arc::new(guidelines))
            .build()
            .unwrap();

        let outcome = orchestrator
            .run(WorkflowRequest::new("Heat pumps"), CancellationToken::new())
            .await;

        assert!(outcome.is_accepted(), "{:?}", outcome.status);
        assert!(outcome.content.starts_with("# Research Report: Heat pumps"));
    }

    #[test]
    fn test_build_without_writer_fails() {
        assert!(matches!(
            WorkflowOrchestrator::builder().build(),
            Err(OrchestratorError::WriterNotConfigured)
        ));
    }

    #[test]
    fn test_outcome_serializes_flat() {
        let outcome = WorkflowOutcome {
            status: WorkflowStatus::Aborted {
                reason: AbortReason::MaxRevisionsExceeded { limit: 3 },
            },
            content: "draft".to_string(),
            revision_count: 3,
            history: vec![],
            trace: vec![WorkflowState::Drafting, WorkflowState::Aborted],
            acceptance_basis: None,
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["reason"]["reason"], "max_revisions_exceeded");
        assert_eq!(json["reason"]["limit"], 3);
        assert_eq!(json["trace"][1], "aborted");
        assert!(json.get("acceptance_basis").is_none());
    }

    #[test]
    fn test_malformed_draft_serializes_with_detail() {
        let outcome = WorkflowOutcome {
            status: WorkflowStatus::Aborted {
                reason: AbortReason::MalformedDraft {
                    detail: "draft is empty".to_string(),
                },
            },
            content: " ".to_string(),
            revision_count: 0,
            history: vec![],
            trace: vec![WorkflowState::Drafting, WorkflowState::Aborted],
            acceptance_basis: None,
        };

        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json["status"], "aborted");
        assert_eq!(json["reason"]["reason"], "malformed_draft");
        assert_eq!(json["reason"]["detail"], "draft is empty");

        let back: WorkflowOutcome = serde_json::from_value(json).unwrap();
        assert_eq!(back, outcome);
    }
}
