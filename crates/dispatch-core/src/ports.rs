//! Port trait definitions
//!
//! These traits define the capabilities the services depend on. Adapters in
//! `dispatch-store` and `dispatch-matching` implement them, and tests
//! substitute their own doubles.

pub mod cache;
pub mod finder;
pub mod store;

pub use cache::ProximityCache;
pub use finder::NearbyFinder;
pub use store::LocationStore;
