use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use dispatch_core::models::{ApiResponse, BatchData, DeletedData, Driver, NewDriver, Point};

use crate::dto::{BatchCreateRequest, UpdateDriverRequest};
use crate::error::ApiError;
use crate::state::AppState;

pub async fn create_driver(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NewDriver>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Driver>>), ApiError> {
    let Json(request) = payload?;
    tracing::info!(requested_id = ?request.id, "Creating driver");

    let driver = state.service.create_driver(request).await?;

    Ok((StatusCode::CREATED, Json(ApiResponse::Success(driver))))
}

pub async fn batch_create_drivers(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<BatchCreateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<BatchData>>), ApiError> {
    let Json(request) = payload?;
    tracing::info!(count = request.drivers.len(), "Creating driver batch");

    let result = state.service.batch_create(request.drivers).await?;

    let data = BatchData {
        count: result.created.len(),
        drivers: result.created,
        failed: result.failed,
    };
    Ok((StatusCode::CREATED, Json(ApiResponse::Success(data))))
}

pub async fn get_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Driver>>, ApiError> {
    let driver = state.service.get_driver(&id).await?;
    Ok(Json(ApiResponse::Success(driver)))
}

pub async fn update_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateDriverRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Driver>>, ApiError> {
    let Json(request) = payload?;
    tracing::info!(driver_id = %id, "Updating driver");

    let driver = state.service.update_driver(&id, request.location).await?;
    Ok(Json(ApiResponse::Success(driver)))
}

pub async fn update_driver_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<Point>, JsonRejection>,
) -> Result<Json<ApiResponse<Driver>>, ApiError> {
    let Json(location) = payload?;

    let driver = state.service.update_location(&id, location).await?;
    Ok(Json(ApiResponse::Success(driver)))
}

pub async fn delete_driver(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<DeletedData>>, ApiError> {
    tracing::info!(driver_id = %id, "Deleting driver");

    state.service.delete_driver(&id).await?;
    Ok(Json(ApiResponse::Success(DeletedData { id })))
}
