pub mod health;
pub mod matching;

pub use health::health_check;
pub use matching::match_rider;
