use std::time::Duration;

use serde::Serialize;

/// Circuit breaker thresholds and timers
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerConfig {
    /// Failures within one interval that open the circuit
    pub failure_threshold: u32,

    /// Length of the rolling window over which closed-state failures are counted
    pub interval: Duration,

    /// How long the circuit stays open before admitting trial calls
    pub cooldown: Duration,

    /// Trial calls admitted while half-open; this many consecutive successes close the circuit
    pub half_open_max_requests: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 6,
            interval: Duration::from_secs(60),
            cooldown: Duration::from_secs(10),
            half_open_max_requests: 3,
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.failure_threshold == 0 {
            return Err("failure_threshold must be greater than 0".to_string());
        }
        if self.half_open_max_requests == 0 {
            return Err("half_open_max_requests must be greater than 0".to_string());
        }
        if self.interval.is_zero() {
            return Err("interval must be greater than 0".to_string());
        }
        if self.cooldown.is_zero() {
            return Err("cooldown must be greater than 0".to_string());
        }
        Ok(())
    }
}
