use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};

use crate::auth::AuthenticatedRider;
use crate::dto::{MatchRequest, MatchResponse};
use crate::error::ApiError;
use crate::state::AppState;

/// Match the authenticated rider with the nearest driver
pub async fn match_rider(
    State(state): State<Arc<AppState>>,
    Extension(rider): Extension<AuthenticatedRider>,
    payload: Result<Json<MatchRequest>, JsonRejection>,
) -> Result<Json<MatchResponse>, ApiError> {
    let Json(request) = payload?;

    let result = state
        .service
        .match_rider(&request.rider(rider.id), request.radius)
        .await?;

    Ok(Json(result.into()))
}
