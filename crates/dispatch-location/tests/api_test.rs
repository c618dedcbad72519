//! Router-level tests for the location API

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use dispatch_core::models::{ApiResponse, BatchData, DeletedData, Driver, ErrorCode, SearchData};
use dispatch_location::{create_router, AppState, LocationService, LocationServiceConfig};
use dispatch_store::{MemoryLocationStore, MokaProximityCache};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tower::ServiceExt;

const API_KEY: &str = "test-key";

fn app() -> Router {
    let service = LocationService::new(
        Arc::new(MemoryLocationStore::new()),
        Arc::new(MokaProximityCache::default()),
        LocationServiceConfig::default(),
    );
    create_router(Arc::new(AppState::new(Arc::new(service), API_KEY)))
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("X-API-Key", API_KEY)
        .header("content-type", "application/json");
    match body {
        Some(body) => builder.body(Body::from(body.to_string())).unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send<T: DeserializeOwned>(
    app: &Router,
    req: Request<Body>,
) -> (StatusCode, ApiResponse<T>) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn point(lon: f64, lat: f64) -> Value {
    json!({ "type": "Point", "coordinates": [lon, lat] })
}

#[tokio::test]
async fn test_health_needs_no_api_key() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store_healthy"], true);
    assert_eq!(body["cache_provider"], "moka");
}

#[tokio::test]
async fn test_driver_routes_require_api_key() {
    let app = app();

    let missing = Request::builder()
        .uri("/api/v1/drivers/d1")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send::<Driver>(&app, missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(matches!(body, ApiResponse::Failure { code: ErrorCode::Unauthorized, .. }));

    let wrong = Request::builder()
        .uri("/api/v1/drivers/d1")
        .header("X-API-Key", "nope")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send::<Driver>(&app, wrong).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let padded = Request::builder()
        .uri("/api/v1/drivers/d1")
        .header("X-API-Key", format!("  {}  ", API_KEY))
        .body(Body::empty())
        .unwrap();
    let (status, _) = send::<Driver>(&app, padded).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_driver_lifecycle() {
    let app = app();

    let (status, created) = send::<Driver>(
        &app,
        request(
            "POST",
            "/api/v1/drivers",
            Some(json!({ "id": "d1", "location": point(29.0, 41.0) })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let created = created.into_result().unwrap();
    assert_eq!(created.id, "d1");

    let (status, fetched) = send::<Driver>(&app, request("GET", "/api/v1/drivers/d1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched.into_result().unwrap(), created);

    let (status, updated) = send::<Driver>(
        &app,
        request("PUT", "/api/v1/drivers/d1", Some(json!({ "location": point(29.1, 41.1) }))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let updated = updated.into_result().unwrap();
    assert_eq!(updated.location.longitude(), 29.1);
    assert_eq!(updated.created_at, created.created_at);

    let (status, moved) = send::<Driver>(
        &app,
        request("PATCH", "/api/v1/drivers/d1/location", Some(point(29.2, 41.2))),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(moved.into_result().unwrap().location.latitude(), 41.2);

    let (status, deleted) =
        send::<DeletedData>(&app, request("DELETE", "/api/v1/drivers/d1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted.into_result().unwrap().id, "d1");

    let (status, gone) = send::<Driver>(&app, request("GET", "/api/v1/drivers/d1", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(matches!(gone, ApiResponse::Failure { code: ErrorCode::NotFound, .. }));
}

#[tokio::test]
async fn test_duplicate_create_conflicts() {
    let app = app();
    let body = json!({ "id": "d1", "location": point(29.0, 41.0) });

    let (status, _) =
        send::<Driver>(&app, request("POST", "/api/v1/drivers", Some(body.clone()))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, response) =
        send::<Driver>(&app, request("POST", "/api/v1/drivers", Some(body))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(matches!(response, ApiResponse::Failure { code: ErrorCode::Conflict, .. }));
}

#[tokio::test]
async fn test_batch_then_search_nearest_first() {
    let app = app();

    let (status, batch) = send::<BatchData>(
        &app,
        request(
            "POST",
            "/api/v1/drivers/batch",
            Some(json!({
                "drivers": [
                    { "id": "far", "location": point(29.02, 41.0) },
                    { "id": "near", "location": point(29.001, 41.0) },
                    { "id": "outside", "location": point(31.0, 41.0) }
                ]
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let batch = batch.into_result().unwrap();
    assert_eq!(batch.count, 3);
    assert!(batch.failed.is_empty());

    let (status, found) = send::<SearchData>(
        &app,
        request(
            "POST",
            "/api/v1/drivers/search",
            Some(json!({ "location": point(29.0, 41.0), "radius": 5000 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let found = found.into_result().unwrap();
    assert_eq!(found.count, 2);
    assert_eq!(found.drivers[0].driver.id, "near");
    assert_eq!(found.drivers[1].driver.id, "far");
}

#[tokio::test]
async fn test_invalid_search_is_rejected() {
    let app = app();

    let (status, response) = send::<SearchData>(
        &app,
        request(
            "POST",
            "/api/v1/drivers/search",
            Some(json!({ "location": point(29.0, 41.0), "radius": 0 })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(matches!(response, ApiResponse::Failure { code: ErrorCode::ValidationError, .. }));

    let (status, response) = send::<SearchData>(
        &app,
        request(
            "POST",
            "/api/v1/drivers/search",
            Some(json!({
                "location": { "type": "Polygon", "coordinates": [29.0, 41.0] },
                "radius": 10
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(matches!(response, ApiResponse::Failure { code: ErrorCode::InvalidRequest, .. }));
}
