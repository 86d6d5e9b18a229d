//! Credential handling for networked providers.
//!
//! Credentials are wrapped in [`secrecy::SecretString`] as soon as they are
//! read, never appear in `Debug` or `Display` output, and are only exposed at
//! the point where a request header is built.
//!
//! ```ignore
//! let cred = ApiCredential::from_settings(&settings, "api_key", "ANTHROPIC_API_KEY", "Anthropic API key", &env)?;
//! request.header("x-api-key", cred.expose());
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

use super::ProviderError;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provider settings in the config file
    Config,
    /// Environment variable
    Environment,
    /// Passed in by the caller
    Programmatic,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
            CredentialSource::Programmatic => write!(f, "programmatic"),
        }
    }
}

/// A securely stored API credential.
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    pub fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load from provider settings, falling back to an environment variable.
    ///
    /// `env` is the variable lookup; pass `|k| std::env::var(k).ok()` for the
    /// process environment.
    pub fn from_settings<F>(
        settings: &JsonValue,
        settings_key: &str,
        env_var: &str,
        name: &'static str,
        env: F,
    ) -> Result<Self, ProviderError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = settings[settings_key].as_str() {
            return Ok(Self::new(value, CredentialSource::Config, name));
        }

        if let Some(value) = env(env_var) {
            return Ok(Self::new(value, CredentialSource::Environment, name));
        }

        Err(ProviderError::NotConfigured(format!(
            "{} required: set '{}' in provider settings or the {} environment variable",
            name, settings_key, env_var
        )))
    }

    /// Expose the value. Call only where a request is being built.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }

    pub fn is_empty(&self) -> bool {
        self.value.expose_secret().is_empty()
    }

    pub fn source(&self) -> CredentialSource {
        self.source
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_credential_redacted_in_debug_and_display() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Config, "Test API key");

        let debug = format!("{:?}", cred);
        let display = format!("{}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(display.contains("Test API key from config"));
        assert_eq!(cred.expose(), secret);
    }

    #[test]
    fn test_settings_take_precedence_over_env() {
        let settings = serde_json::json!({ "api_key": "settings-key" });
        let cred = ApiCredential::from_settings(&settings, "api_key", "KEY", "Test key", |_| {
            Some("env-key".to_string())
        })
        .unwrap();

        assert_eq!(cred.expose(), "settings-key");
        assert_eq!(cred.source(), CredentialSource::Config);
    }

    #[test]
    fn test_falls_back_to_env() {
        let settings = serde_json::json!({});
        let cred = ApiCredential::from_settings(&settings, "api_key", "KEY", "Test key", |k| {
            (k == "KEY").then(|| "env-key".to_string())
        })
        .unwrap();

        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.source(), CredentialSource::Environment);
    }

    #[test]
    fn test_missing_credential_names_both_sources() {
        let err = ApiCredential::from_settings(
            &serde_json::json!({}),
            "api_key",
            "NONEXISTENT_VAR",
            "Test key",
            no_env,
        )
        .unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Test key"));
        assert!(message.contains("api_key"));
        assert!(message.contains("NONEXISTENT_VAR"));
    }
}
