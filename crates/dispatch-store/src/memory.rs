//! In-memory location store for development and testing.
//!
//! Searches are a linear scan over every driver. This implementation uses
//! `RwLock::unwrap()` intentionally. Lock poisoning only occurs when another
//! thread panicked while holding the lock, which is an unrecoverable state.
//! For production workloads, use the PostgreSQL backend.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use dispatch_core::error::{DispatchError, Result};
use dispatch_core::models::{BatchFailure, BatchInsert, Driver, NewDriver, Point, RankedDriver};
use dispatch_core::ports::LocationStore;

use crate::ranking::rank_within;

/// In-memory implementation of LocationStore
#[derive(Debug, Clone, Default)]
pub struct MemoryLocationStore {
    drivers: Arc<RwLock<HashMap<String, Driver>>>,
}

impl MemoryLocationStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored drivers
    pub fn len(&self) -> usize {
        self.drivers.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(drivers: &mut HashMap<String, Driver>, new: NewDriver) -> Result<Driver> {
        let driver = Driver::from_new(new, Utc::now());
        if drivers.contains_key(&driver.id) {
            return Err(DispatchError::AlreadyExists { id: driver.id });
        }
        drivers.insert(driver.id.clone(), driver.clone());
        Ok(driver)
    }
}

#[async_trait]
impl LocationStore for MemoryLocationStore {
    async fn create(&self, driver: NewDriver) -> Result<Driver> {
        let mut drivers = self.drivers.write().unwrap();
        Self::insert(&mut drivers, driver)
    }

    async fn batch_create(&self, batch: Vec<NewDriver>) -> Result<BatchInsert> {
        let mut drivers = self.drivers.write().unwrap();
        let mut result = BatchInsert::default();

        for (index, new) in batch.into_iter().enumerate() {
            let requested_id = new.normalized_id();
            match Self::insert(&mut drivers, new) {
                Ok(driver) => result.created.push(driver),
                Err(e) => result.failed.push(BatchFailure {
                    index,
                    id: requested_id,
                    reason: e.to_string(),
                }),
            }
        }

        Ok(result)
    }

    async fn search_nearby(
        &self,
        center: &Point,
        radius_meters: f64,
        limit: usize,
    ) -> Result<Vec<RankedDriver>> {
        let drivers = self.drivers.read().unwrap();
        Ok(rank_within(
            drivers.values().cloned(),
            center,
            radius_meters,
            limit,
        ))
    }

    async fn get(&self, id: &str) -> Result<Driver> {
        let drivers = self.drivers.read().unwrap();
        drivers
            .get(id)
            .cloned()
            .ok_or_else(|| DispatchError::not_found(id))
    }

    async fn update(&self, driver: &Driver) -> Result<Driver> {
        let mut drivers = self.drivers.write().unwrap();
        let existing = drivers
            .get_mut(&driver.id)
            .ok_or_else(|| DispatchError::not_found(&driver.id))?;

        *existing = existing.relocated(driver.location, Utc::now());
        Ok(existing.clone())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut drivers = self.drivers.write().unwrap();
        drivers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| DispatchError::not_found(id))
    }

    async fn health_check(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn seeded(points: &[(&str, f64, f64)]) -> MemoryLocationStore {
        let store = MemoryLocationStore::new();
        for (id, lon, lat) in points {
            store
                .create(NewDriver::new(Point::new(*lon, *lat)).with_id(*id))
                .await
                .unwrap();
        }
        store
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = MemoryLocationStore::new();
        let created = store
            .create(NewDriver::new(Point::new(29.0, 41.0)))
            .await
            .unwrap();

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_create_duplicate_id_conflicts() {
        let store = seeded(&[("d1", 29.0, 41.0)]).await;
        let result = store
            .create(NewDriver::new(Point::new(30.0, 40.0)).with_id("d1"))
            .await;
        assert!(matches!(result, Err(DispatchError::AlreadyExists { .. })));
    }

    #[tokio::test]
    async fn test_search_orders_by_distance() {
        let store = seeded(&[
            ("far", 29.02, 41.0),
            ("near", 29.001, 41.0),
            ("mid", 29.01, 41.0),
            ("out", 30.0, 41.0),
        ])
        .await;

        let ranked = store
            .search_nearby(&Point::new(29.0, 41.0), 5000.0, 10)
            .await
            .unwrap();

        let ids: Vec<_> = ranked.iter().map(|r| r.driver.id.as_str()).collect();
        assert_eq!(ids, vec!["near", "mid", "far"]);
        assert!(ranked.windows(2).all(|w| w[0].distance <= w[1].distance));
        assert!(ranked.iter().all(|r| r.distance <= 5000.0));
    }

    #[tokio::test]
    async fn test_search_truncates_to_limit() {
        let store = seeded(&[
            ("a", 29.001, 41.0),
            ("b", 29.002, 41.0),
            ("c", 29.003, 41.0),
        ])
        .await;

        let ranked = store
            .search_nearby(&Point::new(29.0, 41.0), 5000.0, 2)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].driver.id, "a");
    }

    #[tokio::test]
    async fn test_zero_limit_means_no_cap() {
        let points: Vec<(String, f64, f64)> = (0..25)
            .map(|i| (format!("d{:02}", i), 29.0 + i as f64 * 0.0001, 41.0))
            .collect();
        let refs: Vec<(&str, f64, f64)> = points
            .iter()
            .map(|(id, lon, lat)| (id.as_str(), *lon, *lat))
            .collect();
        let store = seeded(&refs).await;

        let ranked = store
            .search_nearby(&Point::new(29.0, 41.0), 5000.0, 0)
            .await
            .unwrap();
        assert_eq!(ranked.len(), 25);
    }

    #[tokio::test]
    async fn test_search_with_nothing_in_range_is_empty() {
        let store = seeded(&[("d1", 35.0, 39.0)]).await;
        let ranked = store
            .search_nearby(&Point::new(29.0, 41.0), 1000.0, 10)
            .await
            .unwrap();
        assert!(ranked.is_empty());
    }

    #[tokio::test]
    async fn test_update_relocates_and_keeps_created_at() {
        let store = seeded(&[("d1", 29.0, 41.0)]).await;
        let original = store.get("d1").await.unwrap();

        let moved = original.relocated(Point::new(29.5, 41.5), original.updated_at);
        let updated = store.update(&moved).await.unwrap();

        assert_eq!(updated.location, Point::new(29.5, 41.5));
        assert_eq!(updated.created_at, original.created_at);
        assert!(updated.updated_at >= original.updated_at);
        assert_eq!(store.get("d1").await.unwrap(), updated);
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let store = MemoryLocationStore::new();
        let ghost = Driver::from_new(
            NewDriver::new(Point::new(29.0, 41.0)).with_id("ghost"),
            Utc::now(),
        );
        let result = store.update(&ghost).await;
        assert!(matches!(result, Err(DispatchError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = seeded(&[("d1", 29.0, 41.0)]).await;
        store.delete("d1").await.unwrap();

        assert!(store.is_empty());
        assert!(matches!(
            store.delete("d1").await,
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_batch_create_reports_per_item_failures() {
        let store = seeded(&[("taken", 29.0, 41.0)]).await;

        let result = store
            .batch_create(vec![
                NewDriver::new(Point::new(29.1, 41.1)).with_id("fresh"),
                NewDriver::new(Point::new(29.2, 41.2)).with_id("taken"),
                NewDriver::new(Point::new(29.3, 41.3)),
            ])
            .await
            .unwrap();

        assert_eq!(result.created.len(), 2);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].index, 1);
        assert_eq!(result.failed[0].id.as_deref(), Some("taken"));
        assert_eq!(store.len(), 3);
    }

    #[tokio::test]
    async fn test_batch_create_empty_is_noop() {
        let store = MemoryLocationStore::new();
        let result = store.batch_create(Vec::new()).await.unwrap();
        assert!(result.is_empty());
        assert!(store.is_empty());
    }
}
