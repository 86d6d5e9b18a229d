//! Offline provider for `--dry-run`.
//!
//! Makes no network calls. Drafting prompts get a fixed mock report that
//! carries its own sources; judge prompts get a fixed satisfied judgment.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

use super::{
    factory::ProviderFactory, ChatMessage, CompletionConfig, CompletionResponse,
    LanguageModelProvider, ProviderError,
};
use crate::prompts::JUDGE_SYSTEM_PROMPT;

/// Judgment returned to every judge prompt.
pub const DRY_RUN_JUDGMENT: &str = r#"{"satisfied": true, "explanation": "dry run"}"#;

/// Provider that answers without calling a model.
#[derive(Debug, Default, Clone)]
pub struct DryRunProvider;

impl DryRunProvider {
    pub fn new() -> Self {
        Self
    }

    fn mock_report(request: &str, model: &str) -> String {
        let topic = request
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty() && !l.starts_with('#'))
            .unwrap_or("untitled brief");

        format!(
            "# Research Report: {topic}\n\
             \n\
             ## Summary\n\
             This is a dry run of a report on \"{topic}\". No model was called.\n\
             \n\
             ## Key Findings\n\
             1. **Finding 1**: A live run would contain researched findings [1].\n\
             2. **Finding 2**: Sources would be gathered and cited [2].\n\
             \n\
             ## Sources\n\
             - [1] https://example.com/article1\n\
             - [2] https://example.com/article2\n\
             \n\
             ---\n\
             *Mode: dry run ({model})*\n"
        )
    }
}

#[async_trait]
impl LanguageModelProvider for DryRunProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let is_judgment = messages
            .iter()
            .any(|m| m.role == "system" && m.content == JUDGE_SYSTEM_PROMPT);

        let content = if is_judgment {
            DRY_RUN_JUDGMENT.to_string()
        } else {
            let request = messages
                .iter()
                .rev()
                .find(|m| m.role == "user")
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            Self::mock_report(request, &config.model)
        };

        Ok(CompletionResponse::text(content, config.model.clone()))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "dry-run"
    }
}

/// Factory for [`DryRunProvider`]; takes no settings.
pub struct DryRunProviderFactory;

impl ProviderFactory for DryRunProviderFactory {
    fn provider_type(&self) -> &'static str {
        "dry-run"
    }

    fn create(&self, _settings: &JsonValue) -> Result<Arc<dyn LanguageModelProvider>, ProviderError> {
        Ok(Arc::new(DryRunProvider))
    }

    fn validate_settings(&self, _settings: &JsonValue) -> Result<(), ProviderError> {
        Ok(())
    }

    fn description(&self) -> &'static str {
        "Offline provider returning a fixed mock report"
    }
}
