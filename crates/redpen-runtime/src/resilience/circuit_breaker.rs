//! Circuit breaker for provider calls.
//!
//! When a provider fails repeatedly its circuit opens and later calls fail
//! fast with [`ProviderError::CircuitOpen`]. An open circuit is an error for
//! the caller, never an implicit pass.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::providers::ProviderError;

/// Circuit breaker configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CircuitBreakerConfig {
    /// Failures before opening circuit
    pub failure_threshold: u32,

    /// Time before a trial call is let through
    #[serde(with = "crate::config::humantime_duration")]
    pub recovery_timeout: Duration,

    /// Successes needed to close circuit
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 3,
            recovery_timeout: Duration::from_secs(30),
            success_threshold: 2,
        }
    }
}

/// State of a circuit.
#[derive(Debug, Clone, PartialEq)]
pub enum CircuitState {
    /// Normal operation
    Closed { failures: u32 },

    /// All calls fail fast
    Open { opened_at: Instant },

    /// Trial calls allowed
    HalfOpen { successes: u32 },
}

/// Per-provider circuit breaker.
///
/// Each provider name has its own circuit so one failing backend never
/// blocks another.
pub struct CircuitBreaker {
    states: RwLock<HashMap<String, CircuitState>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            states: RwLock::new(HashMap::new()),
            config,
        }
    }

    /// Whether calls to `provider` should fail fast.
    pub fn is_open(&self, provider: &str) -> bool {
        let states = self.states.read();
        match states.get(provider) {
            Some(CircuitState::Open { opened_at }) => {
                if opened_at.elapsed() >= self.config.recovery_timeout {
                    drop(states);
                    self.transition_to_half_open(provider);
                    false
                } else {
                    true
                }
            }
            _ => false,
        }
    }

    /// Fail with [`ProviderError::CircuitOpen`] if the circuit is open.
    pub fn check(&self, provider: &str) -> Result<(), ProviderError> {
        if self.is_open(provider) {
            Err(ProviderError::CircuitOpen(provider.to_string()))
        } else {
            Ok(())
        }
    }

    pub fn record_success(&self, provider: &str) {
        let mut states = self.states.write();
        match states.get(provider).cloned() {
            Some(CircuitState::HalfOpen { successes }) => {
                if successes + 1 >= self.config.success_threshold {
                    states.insert(provider.to_string(), CircuitState::Closed { failures: 0 });
                    tracing::info!(provider, "Circuit closed after successful recovery");
                } else {
                    states.insert(
                        provider.to_string(),
                        CircuitState::HalfOpen {
                            successes: successes + 1,
                        },
                    );
                }
            }
            Some(CircuitState::Closed { failures }) if failures > 0 => {
                states.insert(provider.to_string(), CircuitState::Closed { failures: 0 });
            }
            _ => {}
        }
    }

    pub fn record_failure(&self, provider: &str) {
        let mut states = self.states.write();
        let failures = match states.get(provider).cloned() {
            None => 0,
            Some(CircuitState::Closed { failures }) => failures,
            Some(CircuitState::HalfOpen { .. }) => {
                states.insert(
                    provider.to_string(),
                    CircuitState::Open {
                        opened_at: Instant::now(),
                    },
                );
                tracing::warn!(provider, "Circuit reopened after failed recovery attempt");
                return;
            }
            Some(CircuitState::Open { .. }) => return,
        };

        if failures + 1 >= self.config.failure_threshold {
            states.insert(
                provider.to_string(),
                CircuitState::Open {
                    opened_at: Instant::now(),
                },
            );
            tracing::warn!(
                provider,
                failures = failures + 1,
                "Circuit opened after repeated failures"
            );
        } else {
            states.insert(
                provider.to_string(),
                CircuitState::Closed {
                    failures: failures + 1,
                },
            );
        }
    }

    fn transition_to_half_open(&self, provider: &str) {
        let mut states = self.states.write();
        if matches!(states.get(provider), Some(CircuitState::Open { .. })) {
            states.insert(provider.to_string(), CircuitState::HalfOpen { successes: 0 });
            tracing::info!(provider, "Circuit half-open, allowing trial call");
        }
    }

    pub fn state(&self, provider: &str) -> CircuitState {
        self.states
            .read()
            .get(provider)
            .cloned()
            .unwrap_or(CircuitState::Closed { failures: 0 })
    }

    /// Close every circuit.
    pub fn reset(&self) {
        self.states.write().clear();
    }
}

impl Default for CircuitBreaker {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
