use std::sync::Arc;

use axum::{extract::State, Json};

use crate::dto::HealthResponse;
use crate::state::AppState;

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let store_healthy = state.service.store_healthy().await;
    let cache_healthy = state.service.cache_healthy().await;

    Json(HealthResponse {
        status: if store_healthy { "ok" } else { "degraded" },
        service: "location",
        store_healthy,
        cache_healthy,
        cache_provider: state.service.cache_provider(),
    })
}
