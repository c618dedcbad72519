use serde::Serialize;

use super::CircuitState;

/// Point-in-time view of a circuit breaker
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    /// Calls that were allowed through
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    /// Calls refused without being attempted
    pub rejected_count: u64,
    /// Failures counted in the current closed-state window
    pub window_failures: u32,
}
