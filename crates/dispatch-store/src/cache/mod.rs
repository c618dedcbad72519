//! Proximity cache providers
//!
//! - `moka`: in-process cache with per-entry TTL, the default
//! - `redis`: shared cache for multi-instance deployments
//! - `noop`: always misses, used when caching is disabled

pub mod moka;
pub mod noop;
pub mod redis;

pub use self::moka::MokaProximityCache;
pub use self::noop::NoopProximityCache;
pub use self::redis::RedisProximityCache;
