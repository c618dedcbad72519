//! Shared-secret gate for the driver routes

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::error::ApiError;
use crate::state::AppState;

pub const API_KEY_HEADER: &str = "X-API-Key";

/// Reject requests whose `X-API-Key` header does not match the configured key.
/// Surrounding whitespace is ignored on both sides.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty());

    match presented {
        None => {
            tracing::debug!(path = %request.uri().path(), "Request without API key");
            Err(ApiError::unauthorized("API key is required"))
        }
        Some(key) if constant_time_eq(key.as_bytes(), state.api_key.trim().as_bytes()) => {
            Ok(next.run(request).await)
        }
        Some(_) => {
            tracing::warn!(path = %request.uri().path(), "Rejected invalid API key");
            Err(ApiError::unauthorized("Invalid API key"))
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
