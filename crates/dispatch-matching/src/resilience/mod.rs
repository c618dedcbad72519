//! # Resilience Module
//!
//! Circuit breaker protecting the matching service from a slow or failing
//! location service.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use dispatch_matching::resilience::{CircuitBreaker, CircuitBreakerConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let breaker = CircuitBreaker::new("location-service", CircuitBreakerConfig::default());
//!
//! let result = breaker
//!     .call(|| async { Ok::<&str, std::io::Error>("success") })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod circuit_breaker;
pub mod config;
pub mod metrics;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerError, CircuitState};
pub use config::CircuitBreakerConfig;
pub use metrics::CircuitBreakerMetrics;
