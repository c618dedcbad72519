//! In-process proximity cache using Moka
//!
//! Not distributed: each process keeps its own entries, so invalidations only
//! reach the instance that performed the mutation. Use the Redis provider when
//! running more than one location service instance.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dispatch_core::error::Result;
use dispatch_core::models::{Driver, NearbyKey, RankedDriver};
use dispatch_core::ports::ProximityCache;
use moka::future::Cache;
use moka::Expiry;
use tracing::debug;

/// Default capacity of each of the two caches
pub const DEFAULT_MAX_CAPACITY: u64 = 10_000;

/// A cached value together with the TTL it was written with
#[derive(Clone)]
struct Entry<V> {
    value: Arc<V>,
    ttl: Duration,
}

/// Expires each entry after the TTL given when it was last written
struct WrittenTtl;

impl<K, V> Expiry<K, Entry<V>> for WrittenTtl {
    fn expire_after_create(
        &self,
        _key: &K,
        entry: &Entry<V>,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &K,
        entry: &Entry<V>,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Proximity cache backed by two moka caches, one for driver records and one
/// for materialized nearby-search results
#[derive(Clone)]
pub struct MokaProximityCache {
    drivers: Cache<String, Entry<Driver>>,
    nearby: Cache<NearbyKey, Entry<Vec<RankedDriver>>>,
}

impl std::fmt::Debug for MokaProximityCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MokaProximityCache")
            .field("drivers", &self.drivers.entry_count())
            .field("nearby", &self.nearby.entry_count())
            .finish()
    }
}

impl Default for MokaProximityCache {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CAPACITY)
    }
}

impl MokaProximityCache {
    /// Create a cache holding at most `max_capacity` entries of each kind
    pub fn new(max_capacity: u64) -> Self {
        let drivers = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(WrittenTtl)
            .build();
        let nearby = Cache::builder()
            .max_capacity(max_capacity)
            .expire_after(WrittenTtl)
            .build();

        debug!(max_capacity, "Moka proximity cache created");

        Self { drivers, nearby }
    }
}

#[async_trait]
impl ProximityCache for MokaProximityCache {
    async fn get_driver(&self, id: &str) -> Result<Option<Driver>> {
        let hit = self.drivers.get(id).await;
        debug!(driver_id = %id, hit = hit.is_some(), "Driver cache lookup (moka)");
        Ok(hit.map(|entry| Driver::clone(&entry.value)))
    }

    async fn set_driver(&self, id: &str, driver: &Driver, ttl: Duration) -> Result<()> {
        let entry = Entry {
            value: Arc::new(driver.clone()),
            ttl,
        };
        self.drivers.insert(id.to_string(), entry).await;
        Ok(())
    }

    async fn delete_driver(&self, id: &str) -> Result<()> {
        self.drivers.invalidate(id).await;
        Ok(())
    }

    async fn get_nearby(&self, key: &NearbyKey) -> Result<Option<Vec<RankedDriver>>> {
        let hit = self.nearby.get(key).await;
        debug!(key = %key.cache_key(), hit = hit.is_some(), "Nearby cache lookup (moka)");
        Ok(hit.map(|entry| entry.value.as_ref().clone()))
    }

    async fn set_nearby(
        &self,
        key: &NearbyKey,
        results: &[RankedDriver],
        ttl: Duration,
    ) -> Result<()> {
        let entry = Entry {
            value: Arc::new(results.to_vec()),
            ttl,
        };
        self.nearby.insert(*key, entry).await;
        Ok(())
    }

    async fn invalidate_all_nearby(&self) -> Result<()> {
        self.nearby.invalidate_all();
        debug!("Nearby cache cleared (moka)");
        Ok(())
    }

    async fn is_healthy(&self) -> bool {
        true
    }

    fn provider_name(&self) -> &'static str {
        "moka"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use dispatch_core::models::{NewDriver, Point};

    fn driver(id: &str) -> Driver {
        Driver::from_new(NewDriver::new(Point::new(29.0, 41.0)).with_id(id), Utc::now())
    }

    fn ranked(id: &str, distance: f64) -> RankedDriver {
        RankedDriver {
            driver: driver(id),
            distance,
        }
    }

    const TTL: Duration = Duration::from_secs(60);

    #[tokio::test]
    async fn test_driver_miss_then_hit() {
        let cache = MokaProximityCache::default();
        assert!(cache.get_driver("d1").await.unwrap().is_none());

        let d = driver("d1");
        cache.set_driver("d1", &d, TTL).await.unwrap();
        assert_eq!(cache.get_driver("d1").await.unwrap(), Some(d));
    }

    #[tokio::test]
    async fn test_delete_driver() {
        let cache = MokaProximityCache::default();
        cache.set_driver("d1", &driver("d1"), TTL).await.unwrap();
        cache.delete_driver("d1").await.unwrap();
        assert!(cache.get_driver("d1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss() {
        let cache = MokaProximityCache::default();
        let key = NearbyKey::new(&Point::new(29.0, 41.0), 1000.0, 10);

        cache
            .set_driver("d1", &driver("d1"), Duration::from_millis(50))
            .await
            .unwrap();
        cache
            .set_nearby(&key, &[ranked("d1", 1.0)], Duration::from_millis(50))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;

        assert!(cache.get_driver("d1").await.unwrap().is_none());
        assert!(cache.get_nearby(&key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_rewrite_uses_new_ttl() {
        let cache = MokaProximityCache::default();
        cache
            .set_driver("d1", &driver("d1"), Duration::from_millis(50))
            .await
            .unwrap();
        cache.set_driver("d1", &driver("d1"), TTL).await.unwrap();

        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(cache.get_driver("d1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_invalidate_all_nearby_clears_every_key() {
        let cache = MokaProximityCache::default();
        let a = NearbyKey::new(&Point::new(29.0, 41.0), 1000.0, 10);
        let b = NearbyKey::new(&Point::new(-73.98, 40.75), 2000.0, 5);

        cache.set_nearby(&a, &[ranked("d1", 1.0)], TTL).await.unwrap();
        cache.set_nearby(&b, &[ranked("d2", 2.0)], TTL).await.unwrap();
        cache.set_driver("d1", &driver("d1"), TTL).await.unwrap();

        cache.invalidate_all_nearby().await.unwrap();

        assert!(cache.get_nearby(&a).await.unwrap().is_none());
        assert!(cache.get_nearby(&b).await.unwrap().is_none());
        // Driver entries are not part of the nearby key space
        assert!(cache.get_driver("d1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_nearby_round_trip_keeps_order() {
        let cache = MokaProximityCache::default();
        let key = NearbyKey::new(&Point::new(29.0, 41.0), 1000.0, 10);
        let results = vec![ranked("a", 1.0), ranked("b", 2.5)];

        cache.set_nearby(&key, &results, TTL).await.unwrap();
        assert_eq!(cache.get_nearby(&key).await.unwrap(), Some(results));
    }
}
