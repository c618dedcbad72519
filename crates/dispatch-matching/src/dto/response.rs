use dispatch_core::models::MatchResult;
use serde::{Deserialize, Serialize};

use crate::resilience::CircuitBreakerMetrics;

/// Matched driver for a rider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResponse {
    pub driver: String,
    pub rider: String,
    pub distance: f64,
}

impl From<MatchResult> for MatchResponse {
    fn from(result: MatchResult) -> Self {
        Self {
            driver: result.driver_id,
            rider: result.rider_id,
            distance: result.distance,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub location_service: CircuitBreakerMetrics,
}
