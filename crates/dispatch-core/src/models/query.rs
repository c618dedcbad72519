use serde::{Deserialize, Serialize};

use super::Point;

/// Default candidate cap for a search that does not set a positive limit
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Prefix shared by every materialized nearby-search cache entry
pub const NEARBY_KEY_PREFIX: &str = "nearby:";

/// Radius-bounded nearest-driver query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Query center
    pub location: Point,

    /// Search radius in meters
    pub radius: f64,

    /// Maximum number of candidates; unset or non-positive means the default
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

impl SearchQuery {
    pub fn new(location: Point, radius: f64) -> Self {
        Self {
            location,
            radius,
            limit: None,
        }
    }

    pub fn with_limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// The limit after substituting `default_limit` for unset or
    /// non-positive values. Cache keys are built from this value, so a search
    /// that leaves the limit unset shares its entry with one that spells out
    /// the default.
    pub fn effective_limit(&self, default_limit: usize) -> usize {
        match self.limit {
            Some(limit) if limit > 0 => limit as usize,
            _ => default_limit,
        }
    }
}

/// Quantized parameters identifying a materialized nearby-search result.
///
/// Coordinates are kept at micro-degree resolution (about 11 cm) and the
/// radius at millimeter resolution, so equal queries always share a key and
/// `-0.0` collapses onto `0.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NearbyKey {
    pub lat_e6: i64,
    pub lon_e6: i64,
    pub radius_mm: i64,
    pub limit: usize,
}

impl NearbyKey {
    pub fn new(center: &Point, radius_meters: f64, limit: usize) -> Self {
        Self {
            lat_e6: quantize(center.latitude(), 1e6),
            lon_e6: quantize(center.longitude(), 1e6),
            radius_mm: quantize(radius_meters, 1e3),
            limit,
        }
    }

    pub fn cache_key(&self) -> String {
        format!(
            "{}{}:{}:{}:{}",
            NEARBY_KEY_PREFIX, self.lat_e6, self.lon_e6, self.radius_mm, self.limit
        )
    }
}

/// Cache key for a single driver record
pub fn driver_cache_key(id: &str) -> String {
    format!("driver:{}", id)
}

fn quantize(value: f64, scale: f64) -> i64 {
    (value * scale).round() as i64
}
