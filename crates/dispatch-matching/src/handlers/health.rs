use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::resilience::CircuitState;
use crate::state::AppState;

/// Health check endpoint. Degraded while the location service breaker is not closed.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let breaker = state.breaker.metrics();
    let status = if breaker.state == CircuitState::Closed {
        "healthy"
    } else {
        "degraded"
    };

    Json(HealthResponse {
        status: status.to_string(),
        service: "matching-service".to_string(),
        location_service: breaker,
    })
}
