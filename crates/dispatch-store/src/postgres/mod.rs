//! PostgreSQL/PostGIS location store

pub mod config;
pub mod drivers;
pub mod migrations;

pub use config::{ConfigError, PoolConfig, PostgresConfig};
pub use migrations::{MigrationError, MigrationManager};

use dispatch_core::error::{DispatchError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

/// PostGIS-backed implementation of `LocationStore`.
///
/// Driver positions live in a `geography(Point, 4326)` column with a GiST
/// index, so radius filtering and nearest-first ordering are done by the
/// database.
pub struct PostgresLocationStore {
    pool: PgPool,
    config: PostgresConfig,
}

impl PostgresLocationStore {
    /// Connect using the given configuration, applying migrations when enabled
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate().map_err(|e| DispatchError::ConfigInvalid {
            key: "database_url".to_string(),
            reason: e.to_string(),
        })?;

        let pool = PgPoolOptions::new()
            .min_connections(config.pool.min_connections)
            .max_connections(config.pool.max_connections)
            .acquire_timeout(config.pool.acquire_timeout)
            .idle_timeout(config.pool.idle_timeout)
            .max_lifetime(config.pool.max_lifetime)
            .connect(&config.database_url)
            .await
            .map_err(|e| DispatchError::storage(format!("Failed to connect to database: {}", e)))?;

        let store = Self { pool, config };
        store.ping().await?;

        if store.config.run_migrations {
            store.run_migrations().await?;
        }

        info!(
            max_connections = store.config.pool.max_connections,
            "PostgreSQL location store ready"
        );
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        MigrationManager::new(self.pool.clone())
            .run_migrations()
            .await
            .map_err(|e| DispatchError::storage(format!("Migration failed: {}", e)))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn config(&self) -> &PostgresConfig {
        &self.config
    }

    /// Round-trip a trivial query
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| DispatchError::storage(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}
