use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::require_rider;
use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let matching = Router::new()
        .route("/api/v1/match", post(handlers::match_rider))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_rider));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(matching)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
