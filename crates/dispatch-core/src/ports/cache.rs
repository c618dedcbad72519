use std::time::Duration;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Driver, NearbyKey, RankedDriver};

/// Port for the proximity cache.
///
/// Every operation is best-effort: callers log errors and carry on as if the
/// cache missed. An entry past its TTL must look exactly like a miss.
#[async_trait]
pub trait ProximityCache: Send + Sync {
    async fn get_driver(&self, id: &str) -> Result<Option<Driver>>;

    async fn set_driver(&self, id: &str, driver: &Driver, ttl: Duration) -> Result<()>;

    async fn delete_driver(&self, id: &str) -> Result<()>;

    async fn get_nearby(&self, key: &NearbyKey) -> Result<Option<Vec<RankedDriver>>>;

    async fn set_nearby(&self, key: &NearbyKey, results: &[RankedDriver], ttl: Duration)
        -> Result<()>;

    /// Drop every materialized nearby-search result, whatever its parameters
    async fn invalidate_all_nearby(&self) -> Result<()>;

    /// Liveness check for operational visibility only
    async fn is_healthy(&self) -> bool;

    /// Short backend name for logs and health output
    fn provider_name(&self) -> &'static str;
}
