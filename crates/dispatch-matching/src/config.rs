use std::env;
use std::time::Duration;

use dispatch_core::{DispatchError, Result};

use crate::client::LocationClientConfig;
use crate::resilience::CircuitBreakerConfig;

/// Matching API configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct MatchingApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub location_url: String,
    pub location_api_key: Option<String>,
    pub jwt_secret: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub breaker: CircuitBreakerConfig,
    pub max_radius_meters: f64,
}

impl MatchingApiConfig {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let breaker_defaults = CircuitBreakerConfig::default();

        let config = Self {
            port: parse_or("DISPATCH_MATCHING_PORT", 8087)?,
            cors_origin: env::var("DISPATCH_CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            location_url: non_empty("DISPATCH_LOCATION_URL")
                .unwrap_or_else(|| "http://localhost:8086".to_string()),
            location_api_key: non_empty("DISPATCH_LOCATION_API_KEY"),
            jwt_secret: non_empty("JWT_SECRET")
                .ok_or_else(|| invalid("JWT_SECRET", "must be set"))?,
            request_timeout: Duration::from_secs(parse_or("DISPATCH_REQUEST_TIMEOUT_SECS", 30)?),
            connect_timeout: Duration::from_secs(parse_or("DISPATCH_CONNECT_TIMEOUT_SECS", 5)?),
            breaker: CircuitBreakerConfig {
                failure_threshold: parse_or(
                    "DISPATCH_BREAKER_FAILURE_THRESHOLD",
                    breaker_defaults.failure_threshold,
                )?,
                interval: Duration::from_secs(parse_or(
                    "DISPATCH_BREAKER_INTERVAL_SECS",
                    breaker_defaults.interval.as_secs(),
                )?),
                cooldown: Duration::from_secs(parse_or(
                    "DISPATCH_BREAKER_COOLDOWN_SECS",
                    breaker_defaults.cooldown.as_secs(),
                )?),
                half_open_max_requests: parse_or(
                    "DISPATCH_BREAKER_HALF_OPEN_REQUESTS",
                    breaker_defaults.half_open_max_requests,
                )?,
            },
            max_radius_meters: parse_or("DISPATCH_MAX_RADIUS_M", 50_000.0)?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.location_url.starts_with("http://") && !self.location_url.starts_with("https://") {
            return Err(invalid("DISPATCH_LOCATION_URL", "must be an http(s) URL"));
        }
        if self.request_timeout.is_zero() {
            return Err(invalid("DISPATCH_REQUEST_TIMEOUT_SECS", "must be greater than 0"));
        }
        if self.connect_timeout.is_zero() {
            return Err(invalid("DISPATCH_CONNECT_TIMEOUT_SECS", "must be greater than 0"));
        }
        if !(self.max_radius_meters.is_finite() && self.max_radius_meters > 0.0) {
            return Err(invalid("DISPATCH_MAX_RADIUS_M", "must be a positive number"));
        }
        if self.jwt_secret.trim().is_empty() {
            return Err(invalid("JWT_SECRET", "cannot be empty"));
        }
        self.breaker
            .validate()
            .map_err(|reason| invalid("DISPATCH_BREAKER_*", &reason))
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    pub fn client_config(&self) -> LocationClientConfig {
        LocationClientConfig {
            base_url: self.location_url.clone(),
            api_key: self.location_api_key.clone(),
            request_timeout: self.request_timeout,
            connect_timeout: self.connect_timeout,
            breaker: self.breaker.clone(),
        }
    }
}

fn invalid(key: &str, reason: &str) -> DispatchError {
    DispatchError::ConfigInvalid {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn non_empty(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T> {
    match non_empty(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| invalid(key, &format!("cannot parse '{}'", raw))),
        None => Ok(default),
    }
}
