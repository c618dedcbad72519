//! Dispatch Matching - Rider to driver matching service
//!
//! Pairs a rider with the nearest available driver, using the location
//! service through a circuit-breaker protected HTTP client.

pub mod auth;
pub mod client;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod resilience;
pub mod router;
pub mod services;
pub mod state;

pub use client::{LocationClient, LocationClientConfig};
pub use config::MatchingApiConfig;
pub use router::create_router;
pub use services::MatchingService;
pub use state::AppState;
