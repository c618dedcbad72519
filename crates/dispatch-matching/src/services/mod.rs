pub mod matching;

pub use matching::{MatchingService, MIN_MATCH_RADIUS_METERS};
