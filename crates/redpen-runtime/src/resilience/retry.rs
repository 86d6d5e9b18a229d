//! Bounded retries with timeout around provider calls.
//!
//! Every call goes through [`ResilientCaller::complete`]:
//! circuit check -> `tokio::time::timeout` -> provider, retried with
//! exponential backoff while the error is retryable.

use backon::{ExponentialBuilder, Retryable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::CircuitBreaker;
use crate::providers::{ChatMessage, CompletionConfig, LanguageModelProvider, ProviderError};

/// Retry policy for provider calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Retries after the first attempt
    pub max_retries: usize,

    #[serde(with = "crate::config::humantime_duration")]
    pub min_delay: Duration,

    #[serde(with = "crate::config::humantime_duration")]
    pub max_delay: Duration,

    /// Backoff multiplier
    pub factor: f32,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            min_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
            factor: 2.0,
        }
    }
}

impl RetryConfig {
    /// No retries at all.
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        ExponentialBuilder::default()
            .with_min_delay(self.min_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times(self.max_retries)
    }
}

/// A provider wrapped with timeout, retry, and circuit breaking.
#[derive(Clone)]
pub struct ResilientCaller {
    provider: Arc<dyn LanguageModelProvider>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryConfig,
    timeout: Duration,
    completion: CompletionConfig,
}

impl ResilientCaller {
    pub fn new(
        provider: Arc<dyn LanguageModelProvider>,
        breaker: Arc<CircuitBreaker>,
        retry: RetryConfig,
        timeout: Duration,
        completion: CompletionConfig,
    ) -> Self {
        Self {
            provider,
            breaker,
            retry,
            timeout,
            completion,
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Send one system + user exchange and return the text.
    pub async fn ask(&self, system: &str, user: String) -> Result<String, ProviderError> {
        self.complete(vec![ChatMessage::system(system), ChatMessage::user(user)])
            .await
    }

    /// Complete `messages`, retrying transient failures.
    ///
    /// Fails with the last error once retries are exhausted, or immediately
    /// for non-retryable errors and open circuits.
    pub async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, ProviderError> {
        let provider = self.provider.as_ref();
        let breaker = self.breaker.as_ref();
        let completion = &self.completion;
        let timeout = self.timeout;
        let messages = &messages;
        let name = provider.name();

        let attempt = move || async move {
            breaker.check(name)?;

            let result = match tokio::time::timeout(timeout, provider.complete(messages.clone(), completion)).await {
                Ok(result) => result,
                Err(_) => Err(ProviderError::Timeout(timeout)),
            };

            match &result {
                Ok(_) => breaker.record_success(name),
                Err(e) if e.is_retryable() => breaker.record_failure(name),
                Err(_) => {}
            }

            result.map(|response| response.content)
        };

        let text = attempt
            .retry(self.retry.backoff())
            .when(|e: &ProviderError| e.is_retryable())
            .notify(|e: &ProviderError, delay: Duration| {
                warn!(provider = name, error = %e, delay = ?delay, "Retrying provider call");
            })
            .await?;

        debug!(provider = name, chars = text.len(), "Provider call succeeded");
        Ok(text)
    }
}
