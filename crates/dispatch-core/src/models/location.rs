//! Coordinates and GeoJSON-style points.
//!
//! Coordinates always travel as `[longitude, latitude]`, matching the GeoJSON
//! and PostGIS axis order.

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};
use crate::geo::haversine_distance;

/// A longitude/latitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub longitude: f64,
    pub latitude: f64,
}

impl Coordinate {
    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self { longitude, latitude }
    }

    /// Check that both axes are finite and inside the WGS 84 ranges
    pub fn validate(&self) -> Result<()> {
        if !self.longitude.is_finite() || !(-180.0..=180.0).contains(&self.longitude) {
            return Err(DispatchError::validation(format!(
                "longitude must be between -180 and 180, got {}",
                self.longitude
            )));
        }
        if !self.latitude.is_finite() || !(-90.0..=90.0).contains(&self.latitude) {
            return Err(DispatchError::validation(format!(
                "latitude must be between -90 and 90, got {}",
                self.latitude
            )));
        }
        Ok(())
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([longitude, latitude]: [f64; 2]) -> Self {
        Self { longitude, latitude }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.longitude, c.latitude]
    }
}

/// GeoJSON Point geometry: `{"type": "Point", "coordinates": [lon, lat]}`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "PointRepr", into = "PointRepr")]
pub struct Point {
    coordinates: Coordinate,
}

impl Point {
    pub const GEOMETRY_TYPE: &'static str = "Point";

    pub fn new(longitude: f64, latitude: f64) -> Self {
        Self {
            coordinates: Coordinate::new(longitude, latitude),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        self.coordinates
    }

    pub fn longitude(&self) -> f64 {
        self.coordinates.longitude
    }

    pub fn latitude(&self) -> f64 {
        self.coordinates.latitude
    }

    /// Great-circle distance to another point in meters
    pub fn distance_to(&self, other: &Point) -> f64 {
        haversine_distance(self.coordinates, other.coordinates)
    }

    pub fn validate(&self) -> Result<()> {
        self.coordinates.validate()
    }
}

impl From<Coordinate> for Point {
    fn from(coordinates: Coordinate) -> Self {
        Self { coordinates }
    }
}

#[derive(Serialize, Deserialize)]
struct PointRepr {
    #[serde(rename = "type")]
    kind: String,
    coordinates: Coordinate,
}

impl TryFrom<PointRepr> for Point {
    type Error = String;

    fn try_from(repr: PointRepr) -> std::result::Result<Self, Self::Error> {
        if repr.kind != Point::GEOMETRY_TYPE {
            return Err(format!("geometry type must be \"Point\", got \"{}\"", repr.kind));
        }
        Ok(Point::from(repr.coordinates))
    }
}

impl From<Point> for PointRepr {
    fn from(point: Point) -> Self {
        Self {
            kind: Point::GEOMETRY_TYPE.to_string(),
            coordinates: point.coordinates,
        }
    }
}
