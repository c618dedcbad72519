//! Error types for Dispatch

use thiserror::Error;

use crate::models::ErrorCode;

#[derive(Debug, Error)]
pub enum DispatchError {
    // Request errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Driver not found: {id}")]
    NotFound { id: String },

    #[error("Driver already exists: {id}")]
    AlreadyExists { id: String },

    // Backend errors
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Cache error: {0}")]
    Cache(String),

    // Upstream location service errors
    #[error("Location service unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Location service rejected the request ({code}): {message}")]
    UpstreamRejected { code: ErrorCode, message: String },

    // Matching outcome
    #[error("No drivers available within the requested radius")]
    NoDriversAvailable,

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },
}

impl DispatchError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound { id: id.into() }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::UpstreamUnavailable(message.into())
    }

    /// Wire code used when this error is reported inside an API envelope
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::ValidationError,
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::AlreadyExists { .. } => ErrorCode::Conflict,
            Self::Storage(_) => ErrorCode::StorageError,
            Self::UpstreamRejected { code, .. } => code.clone(),
            Self::UpstreamUnavailable(_) => ErrorCode::ServiceUnavailable,
            Self::NoDriversAvailable => ErrorCode::NotFound,
            Self::Cache(_) | Self::ConfigInvalid { .. } => ErrorCode::InternalError,
        }
    }
}

pub type Result<T> = std::result::Result<T, DispatchError>;
