use async_trait::async_trait;

use crate::error::Result;
use crate::models::{RankedDriver, SearchQuery};

/// Port for fetching ranked driver candidates around a point.
///
/// Implementations must return candidates in ascending distance order; the
/// matching policy takes the head of the list as the nearest driver.
#[async_trait]
pub trait NearbyFinder: Send + Sync {
    async fn find_nearby(&self, query: &SearchQuery) -> Result<Vec<RankedDriver>>;
}
