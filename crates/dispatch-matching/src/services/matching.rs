use std::sync::Arc;

use dispatch_core::models::{MatchResult, Rider, SearchQuery};
use dispatch_core::ports::NearbyFinder;
use dispatch_core::{DispatchError, Result};
use tracing::{debug, info};

/// Smallest radius a rider may search within, in meters
pub const MIN_MATCH_RADIUS_METERS: f64 = 0.1;

/// Nearest-driver matching policy
pub struct MatchingService {
    finder: Arc<dyn NearbyFinder>,
    max_radius_meters: f64,
}

impl MatchingService {
    pub fn new(finder: Arc<dyn NearbyFinder>, max_radius_meters: f64) -> Self {
        Self {
            finder,
            max_radius_meters,
        }
    }

    pub fn max_radius_meters(&self) -> f64 {
        self.max_radius_meters
    }

    /// Pair the rider with the nearest driver inside `radius` meters.
    ///
    /// Candidates arrive nearest first, so the head of the list wins. An empty
    /// list is [`DispatchError::NoDriversAvailable`]; upstream failures are
    /// returned as they are, without retrying.
    pub async fn match_rider(&self, rider: &Rider, radius: f64) -> Result<MatchResult> {
        self.validate(rider, radius)?;

        let query = SearchQuery::new(rider.location, radius);
        let candidates = self.finder.find_nearby(&query).await?;

        let Some(nearest) = candidates.first() else {
            debug!(rider_id = %rider.id, radius, "No drivers nearby");
            return Err(DispatchError::NoDriversAvailable);
        };

        let result = MatchResult::from_candidate(rider, nearest);
        info!(
            rider_id = %result.rider_id,
            driver_id = %result.driver_id,
            distance = result.distance,
            candidates = candidates.len(),
            "Matched rider"
        );
        Ok(result)
    }

    fn validate(&self, rider: &Rider, radius: f64) -> Result<()> {
        if rider.id.trim().is_empty() {
            return Err(DispatchError::validation("rider id cannot be empty"));
        }
        rider.location.validate()?;

        if !radius.is_finite()
            || radius < MIN_MATCH_RADIUS_METERS
            || radius > self.max_radius_meters
        {
            return Err(DispatchError::validation(format!(
                "radius must be between {} and {} meters",
                MIN_MATCH_RADIUS_METERS, self.max_radius_meters
            )));
        }
        Ok(())
    }
}
