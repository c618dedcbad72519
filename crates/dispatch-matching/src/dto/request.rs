use dispatch_core::models::{Point, Rider};
use serde::{Deserialize, Serialize};

/// Match request: where the rider is and how far to look, in meters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    pub location: Point,
    pub radius: f64,
}

impl MatchRequest {
    pub fn rider(&self, rider_id: impl Into<String>) -> Rider {
        Rider::new(rider_id, self.location)
    }
}
