use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dispatch_core::error::{DispatchError, Result};
use dispatch_core::geo::EARTH_RADIUS_METERS;
use dispatch_core::models::{BatchFailure, BatchInsert, Driver, NewDriver, Point, RankedDriver};
use dispatch_core::ports::LocationStore;
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::{debug, error};

use super::PostgresLocationStore;
use crate::ranking::rank_within;

/// Sphere radius PostGIS uses when `use_spheroid` is false
const POSTGIS_SPHERE_RADIUS_METERS: f64 = 6_371_008.7714;

/// Radius handed to `ST_DWithin`. Scaled to PostGIS's sphere plus a meter
/// of slack so every driver within `radius_meters` by haversine survives
/// the SQL filter; `rank_within` then applies the exact cut.
fn prefilter_radius(radius_meters: f64) -> f64 {
    radius_meters * (POSTGIS_SPHERE_RADIUS_METERS / EARTH_RADIUS_METERS) + 1.0
}

const DRIVER_COLUMNS: &str = r#"
    id,
    ST_X(location::geometry) AS longitude,
    ST_Y(location::geometry) AS latitude,
    created_at,
    updated_at
"#;

fn driver_from_row(row: &PgRow) -> Result<Driver> {
    let decode =
        |e: sqlx::Error| DispatchError::storage(format!("Failed to decode driver row: {}", e));

    let longitude: f64 = row.try_get("longitude").map_err(decode)?;
    let latitude: f64 = row.try_get("latitude").map_err(decode)?;
    let created_at: DateTime<Utc> = row.try_get("created_at").map_err(decode)?;
    let updated_at: DateTime<Utc> = row.try_get("updated_at").map_err(decode)?;

    Ok(Driver {
        id: row.try_get("id").map_err(decode)?,
        location: Point::new(longitude, latitude),
        created_at,
        updated_at,
    })
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

impl PostgresLocationStore {
    async fn insert_driver(&self, new: NewDriver) -> Result<Driver> {
        let driver = Driver::from_new(new, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO drivers (id, location, created_at, updated_at)
            VALUES ($1, ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography, $4, $5)
            "#,
        )
        .bind(&driver.id)
        .bind(driver.location.longitude())
        .bind(driver.location.latitude())
        .bind(driver.created_at)
        .bind(driver.updated_at)
        .execute(self.pool())
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                DispatchError::AlreadyExists {
                    id: driver.id.clone(),
                }
            } else {
                DispatchError::storage(format!("Failed to insert driver: {}", e))
            }
        })?;

        Ok(driver)
    }
}

#[async_trait]
impl LocationStore for PostgresLocationStore {
    async fn create(&self, driver: NewDriver) -> Result<Driver> {
        self.insert_driver(driver).await
    }

    async fn batch_create(&self, drivers: Vec<NewDriver>) -> Result<BatchInsert> {
        let mut result = BatchInsert::default();

        for (index, new) in drivers.into_iter().enumerate() {
            let requested_id = new.normalized_id();
            match self.insert_driver(new).await {
                Ok(driver) => result.created.push(driver),
                Err(e) => {
                    error!(index, error = %e, "Batch item insert failed");
                    result.failed.push(BatchFailure {
                        index,
                        id: requested_id,
                        reason: e.to_string(),
                    });
                }
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
        // Sphere mode so the pre-filter agrees with haversine up to the
        // radius constant. The cap is applied after ranking, never in SQL,
        // so boundary drivers and ties resolve as in the in-memory store.
        let query = format!(
            r#"
            SELECT {}
            FROM drivers
            WHERE ST_DWithin(
                location,
                ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography,
                $3,
                false
            )
            ORDER BY location <-> ST_SetSRID(ST_MakePoint($1, $2), 4326)::geography
            "#,
            DRIVER_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(center.longitude())
            .bind(center.latitude())
            .bind(prefilter_radius(radius_meters))
            .fetch_all(self.pool())
            .await
            .map_err(|e| DispatchError::storage(format!("Failed to search drivers: {}", e)))?;

        let drivers = rows
            .iter()
            .map(driver_from_row)
            .collect::<Result<Vec<_>>>()?;

        debug!(
            candidates = drivers.len(),
            radius_meters, "PostGIS radius search"
        );

        // Distances reported to callers are always haversine
        Ok(rank_within(drivers, center, radius_meters, limit))
    }

    async fn get(&self, id: &str) -> Result<Driver> {
        let query = format!("SELECT {} FROM drivers WHERE id = $1", DRIVER_COLUMNS);

        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(self.pool())
            .await
            .map_err(|e| DispatchError::storage(format!("Failed to get driver: {}", e)))?;

        match row {
            Some(row) => driver_from_row(&row),
            None => Err(DispatchError::not_found(id)),
        }
    }

    async fn update(&self, driver: &Driver) -> Result<Driver> {
        let query = format!(
            r#"
            UPDATE drivers
            SET location = ST_SetSRID(ST_MakePoint($2, $3), 4326)::geography,
                updated_at = $4
            WHERE id = $1
            RETURNING {}
            "#,
            DRIVER_COLUMNS
        );

        let row = sqlx::query(&query)
            .bind(&driver.id)
            .bind(driver.location.longitude())
            .bind(driver.location.latitude())
            .bind(Utc::now())
            .fetch_optional(self.pool())
            .await
            .map_err(|e| DispatchError::storage(format!("Failed to update driver: {}", e)))?;

        match row {
            Some(row) => driver_from_row(&row),
            None => Err(DispatchError::not_found(&driver.id)),
        }
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let result = sqlx::query("DELETE FROM drivers WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| DispatchError::storage(format!("Failed to delete driver: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(DispatchError::not_found(id));
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        self.ping().await.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Great-circle distance as PostGIS computes it in sphere mode
    fn postgis_sphere_distance(a: &Point, b: &Point) -> f64 {
        a.distance_to(b) * (POSTGIS_SPHERE_RADIUS_METERS / EARTH_RADIUS_METERS)
    }

    #[test]
    fn test_prefilter_keeps_haversine_boundary_driver() {
        let center = Point::new(29.0, 41.0);
        for far in [
            Point::new(29.01, 41.0),
            Point::new(29.5, 41.3),
            Point::new(-150.0, -60.0),
        ] {
            let radius = center.distance_to(&far);
            assert!(postgis_sphere_distance(&center, &far) <= prefilter_radius(radius));
        }
    }

    #[test]
    fn test_prefilter_never_shrinks_radius() {
        for radius in [0.0, 1.0, 500.0, 5_000.0, 20_000_000.0] {
            assert!(prefilter_radius(radius) > radius);
        }
    }
}
