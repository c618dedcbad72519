use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Point;

/// A driver and its last reported location.
///
/// The location store owns the authoritative record; caches only hold copies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Driver {
    pub id: String,
    pub location: Point,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Driver {
    /// Materialize a create request, generating an ID when none was supplied
    pub fn from_new(new: NewDriver, now: DateTime<Utc>) -> Self {
        let id = new.normalized_id().unwrap_or_else(generate_driver_id);
        Self {
            id,
            location: new.location,
            created_at: now,
            updated_at: now,
        }
    }

    /// Return a copy moved to `location` with a refreshed update timestamp
    pub fn relocated(&self, location: Point, now: DateTime<Utc>) -> Self {
        Self {
            location,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Create request for a single driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDriver {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub location: Point,
}

impl NewDriver {
    pub fn new(location: Point) -> Self {
        Self { id: None, location }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The requested ID with surrounding whitespace removed, if any remains
    pub fn normalized_id(&self) -> Option<String> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
    }
}

/// Generate an opaque server-side driver ID
pub fn generate_driver_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// A driver paired with its distance in meters from a query center.
///
/// The distance keeps full precision; rounding only happens when a match
/// result is presented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedDriver {
    pub driver: Driver,
    pub distance: f64,
}

/// Outcome of a batch create. Items succeed or fail independently.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchInsert {
    pub created: Vec<Driver>,
    pub failed: Vec<BatchFailure>,
}

impl BatchInsert {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty() && self.failed.is_empty()
    }
}

/// A batch item that could not be persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchFailure {
    /// Position of the item in the request
    pub index: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub reason: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_new_generates_id() {
        let driver = Driver::from_new(NewDriver::new(Point::new(29.0, 41.0)), Utc::now());
        assert_eq!(driver.id.len(), 32);
        assert_eq!(driver.created_at, driver.updated_at);
    }

    #[test]
    fn test_from_new_trims_supplied_id() {
        let new = NewDriver::new(Point::new(29.0, 41.0)).with_id("  driver-1 ");
        let driver = Driver::from_new(new, Utc::now());
        assert_eq!(driver.id, "driver-1");
    }

    #[test]
    fn test_blank_id_is_treated_as_absent() {
        let new = NewDriver::new(Point::new(29.0, 41.0)).with_id("   ");
        assert_eq!(new.normalized_id(), None);
    }

    #[test]
    fn test_relocated_keeps_creation_time() {
        let created = Utc::now();
        let driver = Driver::from_new(NewDriver::new(Point::new(29.0, 41.0)), created);
        let later = created + chrono::Duration::seconds(5);

        let moved = driver.relocated(Point::new(29.1, 41.1), later);
        assert_eq!(moved.id, driver.id);
        assert_eq!(moved.created_at, created);
        assert_eq!(moved.updated_at, later);
        assert_eq!(moved.location, Point::new(29.1, 41.1));
    }
}
