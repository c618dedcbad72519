use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::auth::require_api_key;
use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    let drivers = Router::new()
        .route("/api/v1/drivers", post(handlers::create_driver))
        .route("/api/v1/drivers/batch", post(handlers::batch_create_drivers))
        .route("/api/v1/drivers/search", post(handlers::search_nearby))
        .route(
            "/api/v1/drivers/{id}",
            get(handlers::get_driver)
                .put(handlers::update_driver)
                .delete(handlers::delete_driver),
        )
        .route(
            "/api/v1/drivers/{id}/location",
            patch(handlers::update_driver_location),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_api_key));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(drivers)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
