//! PostgreSQL configuration

use std::time::Duration;
use thiserror::Error;

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}

/// PostgreSQL connection and behavior configuration
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Database connection URL
    pub database_url: String,
    /// Connection pool configuration
    pub pool: PoolConfig,
    /// Whether to apply pending migrations when the store is opened
    pub run_migrations: bool,
}

impl PostgresConfig {
    /// Load configuration from environment variables
    ///
    /// Requires DATABASE_URL. Pool sizes can be overridden with
    /// DISPATCH_DB_MIN_CONNECTIONS and DISPATCH_DB_MAX_CONNECTIONS, and
    /// DISPATCH_DB_MIGRATE=false skips migrations on startup.
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::Missing("DATABASE_URL".to_string()))?;

        let mut config = Self::new(database_url)?;

        if let Some(min) = env_parse::<u32>("DISPATCH_DB_MIN_CONNECTIONS")? {
            config.pool.min_connections = min;
        }
        if let Some(max) = env_parse::<u32>("DISPATCH_DB_MAX_CONNECTIONS")? {
            config.pool.max_connections = max;
        }
        if let Some(migrate) = env_parse::<bool>("DISPATCH_DB_MIGRATE")? {
            config.run_migrations = migrate;
        }

        config.validate()?;
        Ok(config)
    }

    /// Create a new configuration with the given database URL
    pub fn new(database_url: String) -> Result<Self, ConfigError> {
        if database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        Ok(Self {
            database_url,
            pool: PoolConfig::default(),
            run_migrations: true,
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "database_url".to_string(),
                reason: "cannot be empty".to_string(),
            });
        }

        self.pool.validate()?;

        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                reason: format!("cannot parse '{}'", raw),
            }),
        Err(_) => Ok(None),
    }
}

/// Connection pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Minimum number of connections to maintain
    pub min_connections: u32,
    /// Maximum number of connections allowed
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool
    pub acquire_timeout: Duration,
    /// Timeout for idle connections before they are closed
    pub idle_timeout: Duration,
    /// Maximum lifetime of a connection
    pub max_lifetime: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_connections: 2,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        }
    }
}

impl PoolConfig {
    /// Validate pool configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid {
                key: "pool.min_connections".to_string(),
                reason: format!(
                    "min_connections ({}) cannot be greater than max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            });
        }

        if self.max_connections == 0 {
            return Err(ConfigError::Invalid {
                key: "pool.max_connections".to_string(),
                reason: "must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_new_valid() {
        let config = PostgresConfig::new("postgresql://localhost/dispatch".to_string()).unwrap();
        assert!(config.run_migrations);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_new_empty_url() {
        match PostgresConfig::new("  ".to_string()) {
            Err(ConfigError::Invalid { key, .. }) => assert_eq!(key, "database_url"),
            other => panic!("Expected Invalid error, got {:?}", other),
        }
    }

    #[test]
    fn test_pool_config_default() {
        let pool = PoolConfig::default();
        assert_eq!(pool.min_connections, 2);
        assert_eq!(pool.max_connections, 10);
        assert!(pool.validate().is_ok());
    }

    #[test]
    fn test_pool_config_invalid_min_max() {
        let pool = PoolConfig {
            min_connections: 20,
            max_connections: 10,
            ..PoolConfig::default()
        };
        assert!(pool.validate().is_err());
    }

    #[test]
    fn test_pool_config_zero_max() {
        let pool = PoolConfig {
            min_connections: 0,
            max_connections: 0,
            ..PoolConfig::default()
        };
        assert!(pool.validate().is_err());
    }
}
