//! Great-circle distance used to rank and report driver candidates

pub mod distance;

pub use distance::{haversine_distance, EARTH_RADIUS_METERS, MAX_SURFACE_DISTANCE_METERS};
