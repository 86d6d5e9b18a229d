//! Drafting agent traits and common types.

use async_trait::async_trait;
use redpen_core::Feedback;
use thiserror::Error;

use crate::providers::ProviderError;

/// Errors from drafting agents.
#[derive(Error, Debug, Clone)]
pub enum AgentError {
    #[error("Provider call failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// A writer's revision: the full replacement content plus optional notes
/// telling the reviewer what changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub content: String,
    pub notes: Option<String>,
}

impl Revision {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// Gathers notes for the writer before the first draft.
#[async_trait]
pub trait Researcher: Send + Sync {
    fn name(&self) -> &str;

    /// Research notes for `brief`.
    async fn research(&self, brief: &str) -> Result<String, AgentError>;
}

/// Produces and revises draft content.
///
/// # Contract
/// - `draft` returns the full first draft
/// - `revise` returns the full replacement content, never a diff, and may
///   attach notes for the reviewer
/// - Neither sees the draft history; the orchestrator owns it
#[async_trait]
pub trait Writer: Send + Sync {
    fn name(&self) -> &str;

    /// First draft from the brief and optional research notes.
    async fn draft(&self, brief: &str, notes: Option<&str>) -> Result<String, AgentError>;

    /// Revised content addressing every feedback line.
    async fn revise(&self, brief: &str, content: &str, feedback: &Feedback) -> Result<Revision, AgentError>;
}
