//! Cache-aside orchestration for driver reads and writes.
//!
//! Reads consult the proximity cache first and fall back to the store on a
//! miss, populating the cache before returning. Writes go to the store first;
//! only a successful write touches the cache, dropping the driver's own entry
//! and every materialized nearby search. Cache failures are logged and never
//! reach the caller.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use dispatch_core::models::{
    BatchInsert, Driver, NearbyKey, NewDriver, Point, RankedDriver, SearchQuery,
    DEFAULT_SEARCH_LIMIT,
};
use dispatch_core::ports::{LocationStore, ProximityCache};
use dispatch_core::{DispatchError, Result};
use tracing::{debug, error, info, warn};

/// Tunables for the location service
#[derive(Debug, Clone)]
pub struct LocationServiceConfig {
    /// TTL applied to both driver and nearby-search cache entries
    pub cache_ttl: Duration,
    /// Limit substituted when a search leaves it unset or non-positive
    pub default_limit: usize,
    /// Largest limit a search may request
    pub max_limit: usize,
    /// Largest radius a search may request, in meters
    pub max_radius_meters: f64,
}

impl Default for LocationServiceConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(60),
            default_limit: DEFAULT_SEARCH_LIMIT,
            max_limit: 100,
            max_radius_meters: 50_000.0,
        }
    }
}

pub struct LocationService {
    store: Arc<dyn LocationStore>,
    cache: Arc<dyn ProximityCache>,
    config: LocationServiceConfig,
}

impl LocationService {
    pub fn new(
        store: Arc<dyn LocationStore>,
        cache: Arc<dyn ProximityCache>,
        config: LocationServiceConfig,
    ) -> Self {
        Self {
            store,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &LocationServiceConfig {
        &self.config
    }

    pub async fn create_driver(&self, new: NewDriver) -> Result<Driver> {
        new.location.validate()?;

        let driver = self.store.create(new).await.inspect_err(|e| {
            error!(error = %e, "Failed to create driver");
        })?;

        self.forget_driver(&driver.id).await;
        self.invalidate_nearby().await;

        info!(driver_id = %driver.id, "Driver created");
        Ok(driver)
    }

    /// Create several drivers. The whole batch is rejected if any item is
    /// malformed; otherwise items succeed or fail independently in the store.
    pub async fn batch_create(&self, drivers: Vec<NewDriver>) -> Result<BatchInsert> {
        if drivers.is_empty() {
            return Err(DispatchError::validation(
                "batch must contain at least one driver",
            ));
        }
        for (index, driver) in drivers.iter().enumerate() {
            driver
                .location
                .validate()
                .map_err(|e| DispatchError::validation(format!("drivers[{}]: {}", index, e)))?;
        }

        let requested = drivers.len();
        let result = self.store.batch_create(drivers).await.inspect_err(|e| {
            error!(error = %e, requested, "Failed to create driver batch");
        })?;

        if !result.created.is_empty() {
            self.invalidate_nearby().await;
        }

        info!(
            requested,
            created = result.created.len(),
            failed = result.failed.len(),
            "Driver batch created"
        );
        Ok(result)
    }

    /// Drivers within the query radius, nearest first
    pub async fn search_nearby(&self, query: &SearchQuery) -> Result<Vec<RankedDriver>> {
        let limit = self.validate_search(query)?;
        let key = NearbyKey::new(&query.location, query.radius, limit);

        match self.cache.get_nearby(&key).await {
            Ok(Some(hit)) => {
                debug!(
                    key = %key.cache_key(),
                    count = hit.len(),
                    "Nearby search served from cache"
                );
                return Ok(hit);
            }
            Ok(None) => {}
            Err(e) => warn!(error = %e, "Nearby cache read failed, falling back to store"),
        }

        let results = self
            .store
            .search_nearby(&query.location, query.radius, limit)
            .await
            .inspect_err(|e| error!(error = %e, "Nearby search failed"))?;

        if let Err(e) = self
            .cache
            .set_nearby(&key, &results, self.config.cache_ttl)
            .await
        {
            warn!(error = %e, "Failed to cache nearby search");
        }

        Ok(results)
    }

    pub async fn get_driver(&self, id: &str) -> Result<Driver> {
        let id = validate_id(id)?;

        match self.cache.get_driver(id).await {
            Ok(Some(driver)) => return Ok(driver),
            Ok(None) => {}
            Err(e) => warn!(
                driver_id = %id,
                error = %e,
                "Driver cache read failed, falling back to store"
            ),
        }

        let driver = self.store.get(id).await?;

        if let Err(e) = self
            .cache
            .set_driver(id, &driver, self.config.cache_ttl)
            .await
        {
            warn!(driver_id = %id, error = %e, "Failed to cache driver");
        }

        Ok(driver)
    }

    /// Replace a driver's mutable state (its location)
    pub async fn update_driver(&self, id: &str, location: Point) -> Result<Driver> {
        let id = validate_id(id)?;
        location.validate()?;

        let now = Utc::now();
        let replacement = Driver {
            id: id.to_string(),
            location,
            created_at: now,
            updated_at: now,
        };

        let driver = self.store.update(&replacement).await.inspect_err(|e| {
            error!(driver_id = %id, error = %e, "Failed to update driver");
        })?;

        self.forget_driver(id).await;
        self.invalidate_nearby().await;

        info!(driver_id = %id, "Driver updated");
        Ok(driver)
    }

    /// Move an existing driver to a new location
    pub async fn update_location(&self, id: &str, location: Point) -> Result<Driver> {
        let id = validate_id(id)?;
        location.validate()?;

        let current = self.store.get(id).await?;
        let driver = self
            .store
            .update(&current.relocated(location, Utc::now()))
            .await
            .inspect_err(|e| {
                error!(driver_id = %id, error = %e, "Failed to update driver location");
            })?;

        self.forget_driver(id).await;
        self.invalidate_nearby().await;

        debug!(
            driver_id = %id,
            longitude = location.longitude(),
            latitude = location.latitude(),
            "Driver location updated"
        );
        Ok(driver)
    }

    pub async fn delete_driver(&self, id: &str) -> Result<()> {
        let id = validate_id(id)?;

        self.store.delete(id).await.inspect_err(|e| {
            error!(driver_id = %id, error = %e, "Failed to delete driver");
        })?;

        self.forget_driver(id).await;
        self.invalidate_nearby().await;

        info!(driver_id = %id, "Driver deleted");
        Ok(())
    }

    pub async fn store_healthy(&self) -> bool {
        self.store.health_check().await
    }

    pub async fn cache_healthy(&self) -> bool {
        self.cache.is_healthy().await
    }

    pub fn cache_provider(&self) -> &'static str {
        self.cache.provider_name()
    }

    /// Resolve the effective limit, rejecting out-of-range parameters
    fn validate_search(&self, query: &SearchQuery) -> Result<usize> {
        query.location.validate()?;

        if !query.radius.is_finite() || query.radius <= 0.0 {
            return Err(DispatchError::validation("radius must be greater than 0"));
        }
        if query.radius > self.config.max_radius_meters {
            return Err(DispatchError::validation(format!(
                "radius must not exceed {} meters",
                self.config.max_radius_meters
            )));
        }

        let limit = query.effective_limit(self.config.default_limit);
        if limit > self.config.max_limit {
            return Err(DispatchError::validation(format!(
                "limit must not exceed {}",
                self.config.max_limit
            )));
        }
        Ok(limit)
    }

    async fn forget_driver(&self, id: &str) {
        if let Err(e) = self.cache.delete_driver(id).await {
            warn!(driver_id = %id, error = %e, "Failed to drop cached driver");
        }
    }

    async fn invalidate_nearby(&self) {
        if let Err(e) = self.cache.invalidate_all_nearby().await {
            warn!(error = %e, "Failed to invalidate nearby searches");
        }
    }
}

fn validate_id(id: &str) -> Result<&str> {
    let id = id.trim();
    if id.is_empty() {
        return Err(DispatchError::validation("driver id cannot be empty"));
    }
    Ok(id)
}
