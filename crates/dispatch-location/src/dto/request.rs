use dispatch_core::models::{NewDriver, Point};
use serde::Deserialize;

/// Batch create request body
#[derive(Debug, Deserialize)]
pub struct BatchCreateRequest {
    pub drivers: Vec<NewDriver>,
}

/// Full driver update request body
#[derive(Debug, Deserialize)]
pub struct UpdateDriverRequest {
    pub location: Point,
}
