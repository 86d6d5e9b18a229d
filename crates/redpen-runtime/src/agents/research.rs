use async_trait::async_trait;
use tracing::debug;

use super::{AgentError, Researcher};
use crate::prompts::{research_prompt, RESEARCH_SYSTEM_PROMPT};
use crate::resilience::ResilientCaller;

/// Model-backed research agent.
#[derive(Clone)]
pub struct ResearchAgent {
    caller: ResilientCaller,
}

impl ResearchAgent {
    pub fn new(caller: ResilientCaller) -> Self {
        Self { caller }
    }
}

#[async_trait]
impl Researcher for ResearchAgent {
    fn name(&self) -> &str {
        "research"
    }

    async fn research(&self, brief: &str) -> Result<String, AgentError> {
        let notes = self
            .caller
            .ask(RESEARCH_SYSTEM_PROMPT, research_prompt(brief))
            .await?;
        debug!(chars = notes.len(), "Research notes gathered");
        Ok(notes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::{CompletionConfig, FailingProvider, ProviderError, ScriptedProvider};
    use crate::resilience::{CircuitBreaker, RetryConfig};
    use std::sync::Arc;
    use std::time::Duration;

    fn agent(provider: Arc<dyn crate::providers::LanguageModelProvider>) -> ResearchAgent {
        ResearchAgent::new(ResilientCaller::new(
            provider,
            Arc::new(CircuitBreaker::default()),
            RetryConfig::none(),
            Duration::from_secs(5),
            CompletionConfig::default(),
        ))
    }

    #[tokio::test]
    async fn test_research_sends_brief() {
        let provider = Arc::new(ScriptedProvider::new(["CPI rose 3% (BLS, 2024)"]));
        let notes = agent(provider.clone()).research("US inflation").await.unwrap();

        assert_eq!(notes, "CPI rose 3% (BLS, 2024)");
        let request = &provider.transcripts()[0];
        assert_eq!(request[0].content, RESEARCH_SYSTEM_PROMPT);
        assert!(request[1].content.contains("US inflation"));
    }

    #[tokio::test]
    async fn test_research_surfaces_provider_error() {
        let err = agent(Arc::new(FailingProvider::new(ProviderError::AuthError)))
            .research("anything")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Provider(ProviderError::AuthError)));
    }
}
