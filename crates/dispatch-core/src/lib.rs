//! Dispatch Core - Domain models, distance metric and port definitions
//!
//! This crate contains the driver/rider domain model, the error taxonomy shared
//! by both services, and the capability traits that storage, cache and client
//! adapters implement.

pub mod error;
pub mod geo;
pub mod models;
pub mod ports;

pub use error::{DispatchError, Result};
