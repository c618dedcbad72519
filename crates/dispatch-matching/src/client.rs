//! HTTP client for the location service
//!
//! Every search goes through one shared [`CircuitBreaker`]. While it is open
//! searches fail immediately without touching the network.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dispatch_core::models::{ApiResponse, RankedDriver, SearchData, SearchQuery};
use dispatch_core::ports::NearbyFinder;
use dispatch_core::{DispatchError, Result};
use tracing::{debug, warn};

use crate::resilience::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerError};

const SEARCH_PATH: &str = "/api/v1/drivers/search";
const API_KEY_HEADER: &str = "X-API-Key";

/// Connection settings for [`LocationClient`]
#[derive(Debug, Clone)]
pub struct LocationClientConfig {
    /// Base URL of the location service (e.g., "http://localhost:8086")
    pub base_url: String,

    /// Sent as `X-API-Key` when present
    pub api_key: Option<String>,

    /// Upper bound on a whole request, independent of the breaker cooldown
    pub request_timeout: Duration,

    pub connect_timeout: Duration,

    pub breaker: CircuitBreakerConfig,
}

impl LocationClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

impl Default for LocationClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8086".to_string(),
            api_key: None,
            request_timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(5),
            breaker: CircuitBreakerConfig::default(),
        }
    }
}

/// Circuit-breaker protected client for the location service search endpoint
#[derive(Debug, Clone)]
pub struct LocationClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    breaker: Arc<CircuitBreaker>,
}

impl LocationClient {
    pub fn new(config: LocationClientConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| DispatchError::upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.filter(|key| !key.trim().is_empty()),
            breaker: Arc::new(CircuitBreaker::new("location-service", config.breaker)),
        })
    }

    /// The breaker guarding this client, shared by all of its clones
    pub fn breaker(&self) -> &Arc<CircuitBreaker> {
        &self.breaker
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Ranked drivers around the query location, nearest first
    pub async fn search_nearby(&self, query: &SearchQuery) -> Result<Vec<RankedDriver>> {
        let outcome = self.breaker.call(|| self.send_search(query)).await;

        match outcome {
            Ok(data) => Ok(data.drivers),
            Err(CircuitBreakerError::CircuitOpen { component }) => {
                debug!(component = %component, "Skipping location search, circuit open");
                Err(DispatchError::upstream(format!(
                    "circuit breaker open for {}",
                    component
                )))
            }
            Err(CircuitBreakerError::OperationFailed(e)) => {
                warn!(error = %e, "Location search failed");
                Err(e)
            }
        }
    }

    async fn send_search(&self, query: &SearchQuery) -> Result<SearchData> {
        let url = format!("{}{}", self.base_url, SEARCH_PATH);
        let mut request = self.http.post(&url).json(query);
        if let Some(key) = &self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DispatchError::upstream(format!("Failed to reach {}: {}", url, e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DispatchError::upstream(format!("Failed to read response: {}", e)))?;

        let decoded = serde_json::from_str::<ApiResponse<SearchData>>(&body);

        if !status.is_success() {
            return Err(match decoded {
                Ok(ApiResponse::Failure { code, message }) => {
                    DispatchError::UpstreamRejected { code, message }
                }
                _ => DispatchError::upstream(format!(
                    "unexpected status {}: {}",
                    status,
                    body.trim()
                )),
            });
        }

        decoded
            .map_err(|e| DispatchError::upstream(format!("Failed to parse response: {}", e)))?
            .into_result()
    }
}

#[async_trait]
impl NearbyFinder for LocationClient {
    async fn find_nearby(&self, query: &SearchQuery) -> Result<Vec<RankedDriver>> {
        self.search_nearby(query).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let client =
            LocationClient::new(LocationClientConfig::new("http://localhost:8086/")).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8086");
    }

    #[test]
    fn test_blank_api_key_is_not_sent() {
        let config = LocationClientConfig::new("http://localhost:8086").with_api_key("  ");
        let client = LocationClient::new(config).unwrap();
        assert!(client.api_key.is_none());
    }

    #[test]
    fn test_clones_share_breaker() {
        let client = LocationClient::new(LocationClientConfig::default()).unwrap();
        let clone = client.clone();
        assert!(Arc::ptr_eq(client.breaker(), clone.breaker()));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_unavailable() {
        let config = LocationClientConfig {
            connect_timeout: Duration::from_millis(200),
            ..LocationClientConfig::new("http://127.0.0.1:1")
        };
        let client = LocationClient::new(config).unwrap();
        let query = SearchQuery::new(dispatch_core::models::Point::new(29.0, 41.0), 500.0);

        let err = client.search_nearby(&query).await.unwrap_err();
        assert!(matches!(err, DispatchError::UpstreamUnavailable(_)));
        assert_eq!(client.breaker().metrics().failure_count, 1);
    }
}
