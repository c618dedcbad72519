use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub store_healthy: bool,
    pub cache_healthy: bool,
    pub cache_provider: &'static str,
}
