use std::sync::Arc;

use crate::services::LocationService;

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<LocationService>,
    pub api_key: String,
}

impl AppState {
    pub fn new(service: Arc<LocationService>, api_key: impl Into<String>) -> Self {
        Self {
            service,
            api_key: api_key.into(),
        }
    }
}
