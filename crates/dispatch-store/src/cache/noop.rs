//! Proximity cache that never stores anything

use std::time::Duration;

use async_trait::async_trait;
use dispatch_core::error::Result;
use dispatch_core::models::{Driver, NearbyKey, RankedDriver};
use dispatch_core::ports::ProximityCache;

/// Cache provider used when caching is disabled. Every read misses and every
/// write succeeds without effect.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopProximityCache;

#[async_trait]
impl ProximityCache for NoopProximityCache {
    async fn get_driver(&self, _id: &str) -> Result<Option<Driver>> {
        Ok(None)
    }

    async fn set_driver(&self, _id: &str, _driver: &Driver, _ttl: Duration) -> Result<()> {
        Ok(())
    }

    async fn delete_driver(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    async fn get_nearby(&self, _key: &NearbyKey) -> Result<Option<Vec<RankedDriver>>> {
        Ok(None)
    }

    async fn set_nearby(
        &self,
        _key: &NearbyKey,
        _results: &[RankedDriver],
        _ttl: Duration,
    ) -> Result<()> {
        Ok(())
    }

    async fn invalidate_all_nearby(&self) -> Result<()> {
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &'static str {
        "noop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dispatch_core::models::{NewDriver, Point};

    #[tokio::test]
    async fn test_noop_always_misses() {
        let cache = NoopProximityCache;
        let driver = Driver::from_new(NewDriver::new(Point::new(29.0, 41.0)), Utc::now());

        cache
            .set_driver(&driver.id, &driver, Duration::from_secs(60))
            .await
            .unwrap();
        assert!(cache.get_driver(&driver.id).await.unwrap().is_none());
        assert_eq!(cache.provider_name(), "noop");
    }
}
