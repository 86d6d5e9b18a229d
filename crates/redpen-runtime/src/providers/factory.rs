//! Provider registration by name.
//!
//! The config file names a provider (`provider: anthropic`) and carries a
//! free-form `provider_settings` map. Factories turn those settings into a
//! provider instance, so adding a backend never touches an enum.
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.create("dry-run", &serde_json::json!({}))?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LanguageModelProvider, ProviderError};

/// Creates providers of one type from settings.
pub trait ProviderFactory: Send + Sync {
    /// Name used in configuration, e.g. "anthropic".
    fn provider_type(&self) -> &'static str;

    /// Build a provider from its settings.
    fn create(&self, settings: &JsonValue) -> Result<Arc<dyn LanguageModelProvider>, ProviderError>;

    /// Check settings without building anything.
    fn validate_settings(&self, settings: &JsonValue) -> Result<(), ProviderError>;

    fn description(&self) -> &'static str {
        "Language model provider"
    }
}

/// Registry of available provider factories.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any with the same type name.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    /// Create a provider by type name.
    pub fn create(
        &self,
        provider_type: &str,
        settings: &JsonValue,
    ) -> Result<Arc<dyn LanguageModelProvider>, ProviderError> {
        self.factory(provider_type)?.create(settings)
    }

    /// Validate settings for a provider type.
    pub fn validate(&self, provider_type: &str, settings: &JsonValue) -> Result<(), ProviderError> {
        self.factory(provider_type)?.validate_settings(settings)
    }

    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    pub fn has_provider(&self, provider_type: &str) -> bool {
        self.factories.contains_key(provider_type)
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn ProviderFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }

    /// Registry with every built-in provider compiled into this build.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::DryRunProviderFactory));
        #[cfg(feature = "anthropic")]
        registry.register(Arc::new(super::AnthropicProviderFactory::from_process_env()));
        registry
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}
