use async_trait::async_trait;
use redpen_core::Feedback;
use tracing::debug;

use super::{AgentError, Revision, Writer};
use crate::prompts::{
    draft_prompt, revision_prompt, split_revision_notes, Tone, REVISE_SYSTEM_PROMPT, WRITER_SYSTEM_PROMPT,
};
use crate::resilience::ResilientCaller;

/// Model-backed writer.
#[derive(Clone)]
pub struct WriterAgent {
    caller: ResilientCaller,
    tone: Tone,
}

impl WriterAgent {
    pub fn new(caller: ResilientCaller, tone: Tone) -> Self {
        Self { caller, tone }
    }

    pub fn tone(&self) -> Tone {
        self.tone
    }
}

#[async_trait]
impl Writer for WriterAgent {
    fn name(&self) -> &str {
        "writer"
    }

    async fn draft(&self, brief: &str, notes: Option<&str>) -> Result<String, AgentError> {
        let content = self
            .caller
            .ask(WRITER_SYSTEM_PROMPT, draft_prompt(brief, notes, self.tone))
            .await?;
        debug!(chars = content.len(), tone = %self.tone, "First draft written");
        Ok(content)
    }

    async fn revise(&self, brief: &str, content: &str, feedback: &Feedback) -> Result<Revision, AgentError> {
        let reply = self
            .caller
            .ask(
                REVISE_SYSTEM_PROMPT,
                revision_prompt(brief, content, feedback.as_str(), self.tone),
            )
            .await?;
        let (revised, notes) = split_revision_notes(&reply);
        debug!(
            chars = revised.len(),
            feedback_lines = feedback.line_count(),
            notes = notes.is_some(),
            "Draft revised"
        );
        Ok(Revision {
            content: revised.to_string(),
            notes: notes.map(str::to_string),
        })
    }
}
