pub mod driver;
pub mod envelope;
pub mod location;
pub mod matching;
pub mod query;

pub use driver::{generate_driver_id, BatchFailure, BatchInsert, Driver, NewDriver, RankedDriver};
pub use envelope::{ApiResponse, BatchData, DeletedData, ErrorCode, SearchData};
pub use location::{Coordinate, Point};
pub use matching::{round_distance, MatchResult, Rider};
pub use query::{driver_cache_key, NearbyKey, SearchQuery, DEFAULT_SEARCH_LIMIT, NEARBY_KEY_PREFIX};
