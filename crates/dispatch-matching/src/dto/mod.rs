//! Data Transfer Objects for the matching API

pub mod request;
pub mod response;

pub use request::MatchRequest;
pub use response::{HealthResponse, MatchResponse};
