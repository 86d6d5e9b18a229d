//! Anthropic Messages API provider.
//!
//! ## Security
//!
//! The API key is held in an [`ApiCredential`] and only exposed while the
//! request headers are built.

use super::{
    factory::ProviderFactory,
    secrets::{ApiCredential, CredentialSource},
    ChatMessage, CompletionConfig, CompletionResponse, LanguageModelProvider, ProviderError,
    TokenUsage,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the Anthropic API key.
pub const ANTHROPIC_API_KEY_ENV: &str = "ANTHROPIC_API_KEY";

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";
const API_VERSION: &str = "2023-06-01";

/// Anthropic Claude provider.
pub struct AnthropicProvider {
    credential: ApiCredential,
    base_url: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for AnthropicProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnthropicProvider")
            .field("credential", &self.credential)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl AnthropicProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_credential(ApiCredential::new(
            api_key,
            CredentialSource::Programmatic,
            "Anthropic API key",
        ))
    }

    fn with_credential(credential: ApiCredential) -> Self {
        Self {
            credential,
            base_url: DEFAULT_BASE_URL.to_string(),
            client: reqwest::Client::new(),
        }
    }

    /// Build from provider settings (`api_key`, `base_url`), falling back to
    /// `ANTHROPIC_API_KEY` through `env`.
    pub fn from_settings<F>(settings: &JsonValue, env: F) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = ApiCredential::from_settings(
            settings,
            "api_key",
            ANTHROPIC_API_KEY_ENV,
            "Anthropic API key",
            env,
        )?;

        let mut provider = Self::with_credential(credential);
        if let Some(url) = settings["base_url"].as_str() {
            provider.base_url = url.trim_end_matches('/').to_string();
        }
        Ok(provider)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<ContentBlockResponse>,
    model: String,
    stop_reason: Option<String>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
struct ContentBlockResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct AnthropicError {
    error: AnthropicErrorDetail,
}

#[derive(Debug, Deserialize)]
struct AnthropicErrorDetail {
    message: String,
}

/// Split out the system message; the Messages API takes it separately.
fn to_request(messages: Vec<ChatMessage>, config: &CompletionConfig) -> AnthropicRequest {
    let mut system: Option<String> = None;
    let mut api_messages = Vec::with_capacity(messages.len());

    for msg in messages {
        if msg.role == "system" {
            system = Some(match system {
                Some(existing) => format!("{}\n\n{}", existing, msg.content),
                None => msg.content,
            });
        } else {
            api_messages.push(AnthropicMessage {
                role: msg.role,
                content: vec![ContentBlock::Text { text: msg.content }],
            });
        }
    }

    AnthropicRequest {
        model: config.model.clone(),
        max_tokens: config.max_tokens,
        system,
        messages: api_messages,
        temperature: (config.temperature != 0.0).then_some(config.temperature),
    }
}

#[async_trait]
impl LanguageModelProvider for AnthropicProvider {
    async fn complete(
        &self,
        messages: Vec<ChatMessage>,
        config: &CompletionConfig,
    ) -> Result<CompletionResponse, ProviderError> {
        let request = to_request(messages, config);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.credential.expose())
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::HttpError(e.to_string()))?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs);
            return Err(ProviderError::RateLimited { retry_after });
        }

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ProviderError::AuthError);
        }

        if !status.is_success() {
            let message = match response.json::<AnthropicError>().await {
                Ok(body) => body.error.message,
                Err(_) => status.to_string(),
            };
            return Err(ProviderError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;

        let content = body
            .content
            .into_iter()
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            usage: TokenUsage {
                prompt_tokens: body.usage.input_tokens,
                completion_tokens: body.usage.output_tokens,
            },
            model: body.model,
            stop_reason: body.stop_reason,
        })
    }

    async fn health_check(&self) -> bool {
        !self.credential.is_empty()
    }

    fn name(&self) -> &str {
        "anthropic"
    }
}

type EnvLookup = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// Factory for [`AnthropicProvider`].
///
/// ```yaml
/// provider: anthropic
/// provider_settings:
///   api_key: sk-ant-...        # optional, falls back to ANTHROPIC_API_KEY
///   base_url: https://...      # optional
/// ```
pub struct AnthropicProviderFactory {
    env: EnvLookup,
}

impl AnthropicProviderFactory {
    pub fn new(env: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Self {
        Self { env: Arc::new(env) }
    }

    /// Read credentials from the process environment.
    pub fn from_process_env() -> Self {
        Self::new(|key| std::env::var(key).ok())
    }
}

impl ProviderFactory for AnthropicProviderFactory {
    fn provider_type(&self) -> &'static str {
        "anthropic"
    }

    fn create(&self, settings: &JsonValue) -> Result<Arc<dyn LanguageModelProvider>, ProviderError> {
        self.validate_settings(settings)?;
        let provider = AnthropicProvider::from_settings(settings, |k| (self.env)(k))?;
        Ok(Arc::new(provider))
    }

    fn validate_settings(&self, settings: &JsonValue) -> Result<(), ProviderError> {
        if settings["api_key"].as_str().is_none() && (self.env)(ANTHROPIC_API_KEY_ENV).is_none() {
            return Err(ProviderError::NotConfigured(format!(
                "Anthropic API key required: set 'api_key' in provider settings or {} env",
                ANTHROPIC_API_KEY_ENV
            )));
        }

        if let Some(url) = settings["base_url"].as_str() {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ProviderError::NotConfigured(
                    "base_url must start with http:// or https://".to_string(),
                ));
            }
        }

        Ok(())
    }

    fn description(&self) -> &'static str {
        "Anthropic Claude provider"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env() -> AnthropicProviderFactory {
        AnthropicProviderFactory::new(|_| None)
    }

    #[test]
    fn test_request_splits_system_message() {
        let request = to_request(
            vec![ChatMessage::system("rules"), ChatMessage::user("draft")],
            &CompletionConfig::default(),
        );
        assert_eq!(request.system.as_deref(), Some("rules"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, "user");
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_factory_create_with_api_key() {
        let provider = no_env()
            .create(&serde_json::json!({ "api_key": "test-api-key" }))
            .unwrap();
        assert_eq!(provider.name(), "anthropic");
    }

    #[test]
    fn test_factory_requires_key() {
        assert!(no_env().create(&serde_json::json!({})).is_err());

        let with_env = AnthropicProviderFactory::new(|k| {
            (k == ANTHROPIC_API_KEY_ENV).then(|| "env-key".to_string())
        });
        assert!(with_env.validate_settings(&serde_json::json!({})).is_ok());
    }

    #[test]
    fn test_factory_validate_invalid_base_url() {
        let result = no_env().validate_settings(&serde_json::json!({
            "api_key": "test-key",
            "base_url": "invalid-url"
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_settings_base_url_and_source() {
        let provider = AnthropicProvider::from_settings(
            &serde_json::json!({
                "api_key": "config-api-key",
                "base_url": "https://custom.api.com/v1/"
            }),
            |_| None,
        )
        .unwrap();
        assert_eq!(provider.base_url, "https://custom.api.com/v1");
        assert_eq!(provider.credential.source(), CredentialSource::Config);
    }

    #[test]
    fn test_api_key_not_in_debug_output() {
        let secret_key = "sk-ant-REDACTED";
        let provider = AnthropicProvider::new(secret_key);
        let debug_output = format!("{:?}", provider);

        assert!(!debug_output.contains(secret_key));
        assert!(debug_output.contains("[REDACTED]"));
    }

    #[tokio::test]
    async fn test_health_check_requires_key() {
        assert!(AnthropicProvider::new("key").health_check().await);
        assert!(!AnthropicProvider::new("").health_check().await);
    }
}
