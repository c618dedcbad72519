use serde::{Deserialize, Serialize};

use super::{Point, RankedDriver};

/// A rider requesting a match. The ID comes from the authenticated token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rider {
    pub id: String,
    pub location: Point,
}

impl Rider {
    pub fn new(id: impl Into<String>, location: Point) -> Self {
        Self {
            id: id.into(),
            location,
        }
    }
}

/// The driver chosen for a rider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub rider_id: String,
    pub driver_id: String,
    /// Meters, rounded to two decimal places for presentation
    pub distance: f64,
}

impl MatchResult {
    pub fn from_candidate(rider: &Rider, candidate: &RankedDriver) -> Self {
        Self {
            rider_id: rider.id.clone(),
            driver_id: candidate.driver.id.clone(),
            distance: round_distance(candidate.distance),
        }
    }
}

/// Round a distance in meters to two decimal places
pub fn round_distance(meters: f64) -> f64 {
    (meters * 100.0).round() / 100.0
}
