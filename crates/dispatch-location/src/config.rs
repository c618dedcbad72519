use std::env;
use std::time::Duration;

use dispatch_core::models::DEFAULT_SEARCH_LIMIT;
use dispatch_core::{DispatchError, Result};

use crate::services::LocationServiceConfig;

/// Location API configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct LocationApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub cache_enabled: bool,
    pub cache_ttl: Duration,
    pub default_limit: usize,
    pub max_limit: usize,
    pub max_radius_meters: f64,
    pub api_key: String,
}

impl LocationApiConfig {
    /// Load configuration from environment variables.
    ///
    /// `DISPATCH_API_KEY` is required; everything else has a default.
    pub fn from_env() -> Result<Self> {
        let config = Self {
            port: parse_or("DISPATCH_LOCATION_PORT", 8086)?,
            cors_origin: env::var("DISPATCH_CORS_ORIGIN").unwrap_or_else(|_| "*".to_string()),
            database_url: non_empty("DATABASE_URL"),
            redis_url: non_empty("REDIS_URL"),
            cache_enabled: parse_or("DISPATCH_CACHE_ENABLED", true)?,
            cache_ttl: Duration::from_secs(parse_or("DISPATCH_CACHE_TTL_SECS", 60)?),
            default_limit: parse_or("DISPATCH_DEFAULT_LIMIT", DEFAULT_SEARCH_LIMIT)?,
            max_limit: parse_or("DISPATCH_MAX_LIMIT", 100)?,
            max_radius_meters: parse_or("DISPATCH_MAX_RADIUS_M", 50_000.0)?,
            api_key: non_empty("DISPATCH_API_KEY").ok_or_else(|| DispatchError::ConfigInvalid {
                key: "DISPATCH_API_KEY".to_string(),
                reason: "must be set".to_string(),
            })?,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache_ttl.is_zero() {
            return Err(invalid("DISPATCH_CACHE_TTL_SECS", "must be greater than 0"));
        }
        if self.default_limit == 0 {
            return Err(invalid("DISPATCH_DEFAULT_LIMIT", "must be greater than 0"));
        }
        if self.max_limit < self.default_limit {
            return Err(invalid(
                "DISPATCH_MAX_LIMIT",
                "cannot be lower than DISPATCH_DEFAULT_LIMIT",
            ));
        }
        if !(self.max_radius_meters.is_finite() && self.max_radius_meters > 0.0) {
            return Err(invalid("DISPATCH_MAX_RADIUS_M", "must be a positive number"));
        }
        if self.api_key.trim().is_empty() {
            return Err(invalid("DISPATCH_API_KEY", "cannot be empty"));
        }
        Ok(())
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Check if PostgreSQL storage is configured
    pub fn uses_postgres(&self) -> bool {
        self.database_url.is_some()
    }

    pub fn service_config(&self) -> LocationServiceConfig {
        LocationServiceConfig {
            cache_ttl: self.cache_ttl,
            default_limit: self.default_limit,
            max_limit: self.max_limit,
            max_radius_meters: self.max_radius_meters,
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
