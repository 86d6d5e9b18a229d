//! # redpen-runtime
//!
//! Async review/revision workflow for redpen.
//!
//! A writer drafts a report, a reviewer checks it against a guideline set,
//! and the writer revises until the reviewer accepts or the revision limit
//! is hit. Guideline evaluation is deterministic except for `semantic`
//! guidelines, which go to a judge model through the same resilient
//! provider layer the agents use.
//!
//! ## Important
//!
//! Failures never turn into acceptance. A provider outage, an open circuit,
//! or an unreadable judgment aborts the run with a reason.
//!
//! ## Example
//!
//! ```rust,ignore
//! use redpen_runtime::{DryRunProvider, RuntimeConfig, WorkflowOrchestrator, WorkflowRequest};
//! use tokio_util::sync::CancellationToken;
//!
//! let orchestrator = WorkflowOrchestrator::builder()
//!     .config(RuntimeConfig::from_env()?)
//!     .guidelines(Arc::new(GuidelineSet::from_path("guidelines.yaml")?))
//!     .provider(Arc::new(DryRunProvider::new()))
//!     .build()?;
//!
//! let outcome = orchestrator
//!     .run(WorkflowRequest::new("Heat pump adoption in Europe"), CancellationToken::new())
//!     .await;
//! println!("{}", serde_json::to_string_pretty(&outcome)?);
//! ```

pub mod agents;
pub mod cache;
pub mod config;
pub mod judgment;
pub mod orchestrator;
pub mod policy;
pub mod prompts;
pub mod providers;
pub mod resilience;
pub mod reviewer;
pub mod testing;

pub use agents::{AgentError, ResearchAgent, Researcher, Revision, Writer, WriterAgent};
pub use cache::{CacheConfig, JudgmentCache, JudgmentKey};
pub use config::{ConfigError, RuntimeConfig};
pub use judgment::{parse_judgment, Judgment, JudgmentError};
pub use orchestrator::{
    AbortReason, AcceptanceBasis, OrchestratorError, WorkflowOrchestrator,
    WorkflowOrchestratorBuilder, WorkflowOutcome, WorkflowRequest, WorkflowState, WorkflowStatus,
};
pub use policy::{GuidelineEvaluator, GuidelinesPolicy, PolicyError};
pub use prompts::{Tone, REVISION_NOTES_MARKER};
pub use providers::{
    ChatMessage, CompletionConfig, DryRunProvider, LanguageModelProvider, ProviderError,
    ProviderRegistry,
};
pub use resilience::{CircuitBreaker, CircuitBreakerConfig, ResilientCaller, RetryConfig};
pub use reviewer::{ReviewError, ReviewOutput, Reviewer, ReviewerAgent};
