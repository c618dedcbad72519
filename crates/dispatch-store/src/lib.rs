//! Dispatch Store - Location store and proximity cache adapters
//!
//! This crate provides the in-memory and PostGIS implementations of
//! `LocationStore`, and the moka, Redis and no-op implementations of
//! `ProximityCache`.

pub mod cache;
pub mod memory;
pub mod postgres;
mod ranking;

pub use cache::{MokaProximityCache, NoopProximityCache, RedisProximityCache};
pub use memory::MemoryLocationStore;
pub use postgres::{PostgresConfig, PostgresLocationStore};
