use async_trait::async_trait;

use crate::error::Result;
use crate::models::{BatchInsert, Driver, NewDriver, Point, RankedDriver};

/// Port for durable driver records and radius-bounded nearest-neighbor search
#[async_trait]
pub trait LocationStore: Send + Sync {
    /// Persist a new driver, generating an ID when none was supplied.
    ///
    /// Fails with `AlreadyExists` when the ID is taken and `Storage` when the
    /// write cannot be completed.
    async fn create(&self, driver: NewDriver) -> Result<Driver>;

    /// Persist several drivers. Each item succeeds or fails on its own, so
    /// the result may mix created drivers and failures. Empty input is a no-op.
    async fn batch_create(&self, drivers: Vec<NewDriver>) -> Result<BatchInsert>;

    /// Drivers within `radius_meters` of `center`, sorted by ascending distance
    /// and truncated to `limit`.
    ///
    /// A `limit` of 0 means no cap at this layer; callers apply the default
    /// search limit before getting here. Returns an empty list, not an error,
    /// when nothing is in range.
    async fn search_nearby(
        &self,
        center: &Point,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<RankedDriver>>;

    /// Fetch a driver, failing with `NotFound` when absent
    async fn get(&self, id: &str) -> Result<Driver>;

    /// Replace a driver's location by ID and refresh its update timestamp.
    /// Fails with `NotFound` when the ID does not exist.
    async fn update(&self, driver: &Driver) -> Result<Driver>;

    /// Remove a driver, failing with `NotFound` when absent
    async fn delete(&self, id: &str) -> Result<()>;

    /// Whether the backing engine is reachable
    async fn health_check(&self) -> bool;
}
