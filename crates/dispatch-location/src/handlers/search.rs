use std::sync::Arc;

use axum::{extract::rejection::JsonRejection, extract::State, Json};
use dispatch_core::models::{ApiResponse, SearchData, SearchQuery};

use crate::error::ApiError;
use crate::state::AppState;

pub async fn search_nearby(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<SearchQuery>, JsonRejection>,
) -> Result<Json<ApiResponse<SearchData>>, ApiError> {
    let Json(query) = payload?;

    tracing::info!(
        longitude = query.location.longitude(),
        latitude = query.location.latitude(),
        radius = query.radius,
        limit = ?query.limit,
        "Searching nearby drivers"
    );

    let drivers = state.service.search_nearby(&query).await?;

    Ok(Json(ApiResponse::Success(SearchData::new(drivers))))
}
