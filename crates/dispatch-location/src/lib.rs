//! Dispatch Location - Driver location service
//!
//! Cache-aside orchestration over a `LocationStore` and a `ProximityCache`,
//! exposed as an axum HTTP API guarded by a shared API key.

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod router;
pub mod services;
pub mod state;

pub use config::LocationApiConfig;
pub use router::create_router;
pub use services::{LocationService, LocationServiceConfig};
pub use state::AppState;
