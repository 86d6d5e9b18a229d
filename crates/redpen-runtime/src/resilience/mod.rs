//! Resilience for provider calls.
//!
//! - Circuit breaker per provider name
//! - Retry with exponential backoff (`backon`)
//! - Per-attempt timeout (`tokio::time::timeout`)
//!
//! Exhausted retries and open circuits surface as errors. Nothing here ever
//! substitutes a default answer for a failed call.

mod circuit_breaker;
mod retry;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitState};
pub use retry::{ResilientCaller, RetryConfig};
