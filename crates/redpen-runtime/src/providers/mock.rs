//! Deterministic providers for tests and offline runs.
//!
//! Fixed input produces fixed output and nothing touches the network.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use super::{ChatMessage, CompletionConfig, CompletionResponse, LanguageModelProvider, ProviderError};

type Responder = Box<dyn Fn(&[ChatMessage]) -> Result<String, ProviderError> + Send + Sync>;

enum Script {
    /// Reply with the last message's content
    Echo,

    /// Reply from a queue; the final entry repeats once the queue drains
    Queue {
        pending: VecDeque<Result<String, ProviderError>>,
        last: Option<Result<String, ProviderError>>,
    },

    /// Reply computed from the messages
    Responder(Responder),
}

/// Provider that replays a script.
pub struct ScriptedProvider {
    name: String,
    script: Mutex<Script>,
    delay: Option<Duration>,
    calls: AtomicU32,
    transcripts: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    fn with_script(script: Script) -> Self {
        Self {
            name: "scripted".to_string(),
            script: Mutex::new(script),
            delay: None,
            calls: AtomicU32::new(0),
            transcripts: Mutex::new(Vec::new()),
        }
    }

    /// Echo the last message back.
    pub fn echo() -> Self {
        Self::with_script(Script::Echo)
    }

    /// Reply with each response in turn, repeating the last one.
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_results(responses.into_iter().map(|r| Ok(r.into())))
    }

    /// Replay a sequence of successes and failures, repeating the last one.
    pub fn with_results<I>(results: I) -> Self
    where
        I: IntoIterator<Item = Result<String, ProviderError>>,
    {
        Self::with_script(Script::Queue {
            pending: results.into_iter().collect(),
            last: None,
        })
    }

    /// Compute each reply from the request messages.
    pub fn from_fn<F>(responder: F) -> Self
    where
        F: Fn(&[ChatMessage]) -> Result<String, ProviderError> + Send + Sync + 'static,
    {
        Self::with_script(Script::Responder(Box::new(responder)))
    }

    /// Sleep before every reply (for timeout tests).
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Number of completions requested so far.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Every request received, in order.
    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.transcripts.lock().clone()
    }

    fn next_reply(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        let mut script = self.script.lock();
        match &mut *script {
            Script::Echo => Ok(messages.last().map(|m| m.content.clone()).unwrap_or_default()),
            Script::Queue { pending, last } => {
                if let Some(next) = pending.pop_front() {
                    *last = Some(next.clone());
                    next
                } else {
                    last.clone().unwrap_or_else(|| {
                        Err(ProviderError::NotConfigured("script is empty".to_string()))
                    })
                }
            }
            Script::Responder(responder) => responder(messages),
        }
    }
}

#[async_trait]
impl LanguageModelProvider for ScriptedProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.transcripts.lock().push(messages.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let content = self.next_reply(&messages)?;
        Ok(CompletionResponse::text(content, config.model.clone()))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Provider that always fails with the same error.
pub struct FailingProvider {
    error: ProviderError,
    calls: AtomicU32,
}

impl FailingProvider {
    pub fn new(error: ProviderError) -> Self {
        Self {
            error,
            calls: AtomicU32::new(0),
        }
    }

    /// Fails with a retryable HTTP error.
    pub fn unavailable() -> Self {
        Self::new(ProviderError::HttpError("connection refused".to_string()))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LanguageModelProvider for FailingProvider {
    async fn complete(
        &self,
        _messages: Vec<ChatMessage>,
        _config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(self.error.clone())
    }

    async fn health_check(&self) -> bool {
        false
    }

    fn name(&self) -> &str {
        "failing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_queue_repeats_last_response() {
        let provider = ScriptedProvider::new(["first", "second"]);
        let config = CompletionConfig::default();

        assert_eq!(provider.generate("a", &config).await.unwrap(), "first");
        assert_eq!(provider.generate("b", &config).await.unwrap(), "second");
        assert_eq!(provider.generate("c", &config).await.unwrap(), "second");
        assert_eq!(provider.calls(), 3);
    }

    #[tokio::test]
    async fn test_empty_queue_fails() {
        let provider = ScriptedProvider::with_results(Vec::new());
        let result = provider.generate("a", &CompletionConfig::default()).await;
        assert!(matches!(result, Err(ProviderError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn test_responder_sees_messages() {
        let provider = ScriptedProvider::from_fn(|messages| Ok(format!("{} messages", messages.len())));
        let response = provider
            .complete(
                vec![ChatMessage::system("s"), ChatMessage::user("u")],
                &CompletionConfig::default(),
            )
            .await
            .unwrap();
        assert_eq!(response.content, "2 messages");
        assert_eq!(provider.transcripts()[0][1].content, "u");
    }

    #[tokio::test]
    async fn test_failing_provider_counts_calls() {
        let provider = FailingProvider::unavailable();
        assert!(provider.generate("a", &CompletionConfig::default()).await.is_err());
        assert!(provider.generate("a", &CompletionConfig::default()).await.is_err());
        assert_eq!(provider.calls(), 2);
        assert!(!provider.health_check().await);
    }
}
