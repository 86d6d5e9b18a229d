//! Runtime configuration.
//!
//! Loaded from an optional YAML file, then overridden by `REDPEN_*`
//! environment variables. Durations are human-readable (`30s`, `500ms`).
//!
//! ```yaml
//! max_revisions: 3
//! guidelines_enabled: true
//! provider_timeout: 30s
//! tone: analytical
//! provider: anthropic
//! completion:
//!   model: claude-sonnet-4-5
//! retry:
//!   max_retries: 3
//!   min_delay: 500ms
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::prompts::Tone;
use crate::providers::CompletionConfig;
use crate::resilience::{CircuitBreakerConfig, RetryConfig};

/// Prefix shared by every environment override.
pub const ENV_PREFIX: &str = "REDPEN_";

/// Errors loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Invalid value for {key}: {message}")]
    InvalidEnv { key: String, message: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Everything the workflow needs besides the guidelines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Applied revisions allowed before aborting
    pub max_revisions: u32,

    /// When false the reviewer accepts without evaluating
    pub guidelines_enabled: bool,

    /// Per-attempt provider timeout
    #[serde(with = "humantime_duration")]
    pub provider_timeout: Duration,

    /// Drafts longer than this are rejected as malformed
    pub max_content_chars: usize,

    /// Use the offline provider regardless of `provider`
    pub dry_run: bool,

    pub tone: Tone,

    /// Registered provider name
    pub provider: String,

    /// Free-form settings passed to the provider factory
    pub provider_settings: JsonValue,

    pub completion: CompletionConfig,

    pub retry: RetryConfig,

    pub circuit_breaker: CircuitBreakerConfig,

    pub cache: CacheConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_revisions: 3,
            guidelines_enabled: true,
            provider_timeout: Duration::from_secs(30),
            max_content_chars: 200_000,
            dry_run: false,
            tone: Tone::Objective,
            provider: "anthropic".to_string(),
            provider_settings: JsonValue::Object(Default::default()),
            completion: CompletionConfig::default(),
            retry: RetryConfig::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Defaults overridden by the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env(|key| std::env::var(key).ok())
    }

    /// Apply `REDPEN_*` overrides read through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name));

        if let Some(v) = var("MAX_REVISIONS") {
            self.max_revisions = parse_env("MAX_REVISIONS", &v, |s| s.parse::<u32>().ok())?;
        }
        if let Some(v) = var("GUIDELINES_ENABLED") {
            self.guidelines_enabled = parse_env("GUIDELINES_ENABLED", &v, parse_bool)?;
        }
        if let Some(v) = var("PROVIDER_TIMEOUT") {
            self.provider_timeout =
                parse_env("PROVIDER_TIMEOUT", &v, |s| humantime::parse_duration(s).ok())?;
        }
        if let Some(v) = var("MAX_CONTENT_CHARS") {
            self.max_content_chars =
                parse_env("MAX_CONTENT_CHARS", &v, |s| s.parse::<usize>().ok())?;
        }
        if let Some(v) = var("DRY_RUN") {
            self.dry_run = parse_env("DRY_RUN", &v, parse_bool)?;
        }
        if let Some(v) = var("TONE") {
            self.tone = Tone::parse_or_default(&v);
        }
        if let Some(v) = var("PROVIDER").filter(|v| !v.trim().is_empty()) {
            self.provider = v.trim().to_string();
        }
        if let Some(v) = var("MODEL").filter(|v| !v.trim().is_empty()) {
            self.completion.model = v.trim().to_string();
        }

        self.validate()?;
        Ok(self)
    }

    /// Reject values the workflow cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.provider_timeout.is_zero() {
            return Err(ConfigError::Invalid("provider_timeout must be positive".to_string()));
        }
        if self.max_content_chars == 0 {
            return Err(ConfigError::Invalid("max_content_chars must be positive".to_string()));
        }
        if self.provider.trim().is_empty() && !self.dry_run {
            return Err(ConfigError::Invalid("provider must be set".to_string()));
        }
        if self.retry.factor < 1.0 {
            return Err(ConfigError::Invalid("retry.factor must be at least 1.0".to_string()));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(ConfigError::Invalid(
                "circuit_breaker.failure_threshold must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Provider name after applying `dry_run`.
    pub fn effective_provider(&self) -> &str {
        if self.dry_run {
            "dry-run"
        } else {
            &self.provider
        }
    }
}

fn parse_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn parse_env<T>(key: &str, value: &str, parse: impl Fn(&str) -> Option<T>) -> Result<T, ConfigError> {
    parse(value.trim()).ok_or_else(|| ConfigError::InvalidEnv {
        key: format!("{}{}", ENV_PREFIX, key),
        message: format!("cannot parse '{}'", value),
    })
}

/// Serde adapter for `humantime` durations.
pub(crate) mod humantime_duration {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = RuntimeConfig::default();
        assert_eq!(config.max_revisions, 3);
        assert!(config.guidelines_enabled);
        assert_eq!(config.provider_timeout, Duration::from_secs(30));
        assert_eq!(config.tone, Tone::Objective);
        assert_eq!(config.effective_provider(), "anthropic");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_with_human_durations() {
        let config = RuntimeConfig::from_yaml(
            r#"
max_revisions: 5
provider_timeout: 1m 30s
tone: critical
retry:
  max_retries: 1
  min_delay: 250ms
circuit_breaker:
  recovery_timeout: 2m
"#,
        )
        .unwrap();

        assert_eq!(config.max_revisions, 5);
        assert_eq!(config.provider_timeout, Duration::from_secs(90));
        assert_eq!(config.tone, Tone::Critical);
        assert_eq!(config.retry.max_retries, 1);
        assert_eq!(config.retry.min_delay, Duration::from_millis(250));
        assert_eq!(config.retry.max_delay, Duration::from_secs(10));
        assert_eq!(config.circuit_breaker.recovery_timeout, Duration::from_secs(120));
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
    }

    #[test]
    fn test_yaml_rejects_unknown_fields() {
        assert!(matches!(
            RuntimeConfig::from_yaml("max_revison: 2"),
            Err(ConfigError::YamlError(_))
        ));
    }

    #[test]
    fn test_env_overrides() {
        let config = RuntimeConfig::default()
            .with_env(env(&[
                ("REDPEN_MAX_REVISIONS", "1"),
                ("REDPEN_GUIDELINES_ENABLED", "false"),
                ("REDPEN_PROVIDER_TIMEOUT", "5s"),
                ("REDPEN_DRY_RUN", "true"),
                ("REDPEN_TONE", "unheard-of"),
                ("REDPEN_MODEL", "claude-haiku-4-5"),
            ]))
            .unwrap();

        assert_eq!(config.max_revisions, 1);
        assert!(!config.guidelines_enabled);
        assert_eq!(config.provider_timeout, Duration::from_secs(5));
        assert_eq!(config.tone, Tone::Objective);
        assert_eq!(config.completion.model, "claude-haiku-4-5");
        assert_eq!(config.effective_provider(), "dry-run");
    }

    #[test]
    fn test_env_rejects_garbage() {
        let result = RuntimeConfig::default().with_env(env(&[("REDPEN_MAX_REVISIONS", "many")]));
        match result {
            Err(ConfigError::InvalidEnv { key, .. }) => assert_eq!(key, "REDPEN_MAX_REVISIONS"),
            other => panic!("expected InvalidEnv, got {:?}", other),
        }
    }

    #[test]
    fn test_zero_timeout_is_invalid() {
        assert!(matches!(
            RuntimeConfig::from_yaml("provider_timeout: 0s"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_demo_config_parses() {
        let config = RuntimeConfig::from_yaml(include_str!("../../../demos/config.yaml")).unwrap();
        assert_eq!(config.tone, Tone::Analytical);
        assert_eq!(config.cache.ttl, Duration::from_secs(3600));
    }
}
