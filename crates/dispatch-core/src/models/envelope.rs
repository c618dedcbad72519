//! Typed response envelope of the location API.
//!
//! On the wire every response is `{"success": bool, "data"?, "error"?, "message"?}`.
//! In Rust it is an [`ApiResponse`]: either a typed payload or a typed failure.

use std::fmt;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::{BatchFailure, Driver, RankedDriver};
use crate::error::{DispatchError, Result};

/// Machine-readable failure code carried in the `error` field
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ErrorCode {
    InvalidRequest,
    ValidationError,
    NotFound,
    Conflict,
    Unauthorized,
    StorageError,
    InternalError,
    ServiceUnavailable,
    UpstreamError,
    /// A code this build does not know about
    Other(String),
}

impl ErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            ErrorCode::InvalidRequest => "invalid_request",
            ErrorCode::ValidationError => "validation_error",
            ErrorCode::NotFound => "not_found",
            ErrorCode::Conflict => "conflict",
            ErrorCode::Unauthorized => "unauthorized",
            ErrorCode::StorageError => "storage_error",
            ErrorCode::InternalError => "internal_error",
            ErrorCode::ServiceUnavailable => "service_unavailable",
            ErrorCode::UpstreamError => "upstream_error",
            ErrorCode::Other(code) => code,
        }
    }
}

impl From<String> for ErrorCode {
    fn from(code: String) -> Self {
        match code.as_str() {
            "invalid_request" => ErrorCode::InvalidRequest,
            "validation_error" => ErrorCode::ValidationError,
            "not_found" => ErrorCode::NotFound,
            "conflict" => ErrorCode::Conflict,
            "unauthorized" => ErrorCode::Unauthorized,
            "storage_error" => ErrorCode::StorageError,
            "internal_error" => ErrorCode::InternalError,
            "service_unavailable" => ErrorCode::ServiceUnavailable,
            "upstream_error" => ErrorCode::UpstreamError,
            _ => ErrorCode::Other(code),
        }
    }
}

impl From<ErrorCode> for String {
    fn from(code: ErrorCode) -> Self {
        code.as_str().to_string()
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result envelope exchanged between the location API and its clients
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success(T),
    Failure { code: ErrorCode, message: String },
}

impl<T> ApiResponse<T> {
    pub fn failure(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Failure {
            code,
            message: message.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiResponse::Success(_))
    }

    /// Decode into the error taxonomy. A failure envelope becomes
    /// [`DispatchError::UpstreamRejected`] regardless of the HTTP status it came with.
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiResponse::Success(data) => Ok(data),
            ApiResponse::Failure { code, message } => {
                Err(DispatchError::UpstreamRejected { code, message })
            }
        }
    }
}

impl<T> From<&DispatchError> for ApiResponse<T> {
    fn from(err: &DispatchError) -> Self {
        Self::failure(err.code(), err.to_string())
    }
}

#[derive(Serialize)]
struct EnvelopeOut<'a, T> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<&'a T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a ErrorCode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'a str>,
}

#[derive(Deserialize)]
struct EnvelopeIn<T> {
    success: bool,
    data: Option<T>,
    error: Option<ErrorCode>,
    message: Option<String>,
}

impl<T: Serialize> Serialize for ApiResponse<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let out = match self {
            ApiResponse::Success(data) => EnvelopeOut {
                success: true,
                data: Some(data),
                error: None,
                message: None,
            },
            ApiResponse::Failure { code, message } => EnvelopeOut {
                success: false,
                data: None,
                error: Some(code),
                message: Some(message.as_str()),
            },
        };
        out.serialize(serializer)
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for ApiResponse<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = EnvelopeIn::<T>::deserialize(deserializer)?;
        if raw.success {
            let data = raw
                .data
                .ok_or_else(|| D::Error::custom("successful response is missing `data`"))?;
            Ok(ApiResponse::Success(data))
        } else {
            Ok(ApiResponse::Failure {
                code: raw.error.unwrap_or(ErrorCode::InternalError),
                message: raw.message.unwrap_or_default(),
            })
        }
    }
}

/// Payload of a nearby search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchData {
    pub count: usize,
    pub drivers: Vec<RankedDriver>,
}

impl SearchData {
    pub fn new(drivers: Vec<RankedDriver>) -> Self {
        Self {
            count: drivers.len(),
            drivers,
        }
    }
}

/// Payload of a batch create. `count` is the number of drivers created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchData {
    pub count: usize,
    pub drivers: Vec<Driver>,
    #[serde(default)]
    pub failed: Vec<BatchFailure>,
}

/// Payload of a delete
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeletedData {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_envelope_shape() {
        let response = ApiResponse::Success(DeletedData { id: "d1".to_string() });
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value, json!({"success": true, "data": {"id": "d1"}}));
    }

    #[test]
    fn test_failure_envelope_shape() {
        let response: ApiResponse<DeletedData> =
            ApiResponse::failure(ErrorCode::NotFound, "Driver not found: d1");
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(
            value,
            json!({"success": false, "error": "not_found", "message": "Driver not found: d1"})
        );
    }

    #[test]
    fn test_decode_search_payload() {
        let body = json!({
            "success": true,
            "data": {
                "count": 1,
                "drivers": [{
                    "driver": {
                        "id": "d1",
                        "location": {"type": "Point", "coordinates": [29.0, 41.0]},
                        "created_at": "2024-01-01T00:00:00Z",
                        "updated_at": "2024-01-01T00:00:00Z"
                    },
                    "distance": 12.5
                }]
            }
        });

        let response: ApiResponse<SearchData> = serde_json::from_value(body).unwrap();
        let data = response.into_result().unwrap();
        assert_eq!(data.count, 1);
        assert_eq!(data.drivers[0].driver.id, "d1");
        assert_eq!(data.drivers[0].distance, 12.5);
    }

    #[test]
    fn test_failure_decodes_into_upstream_rejected() {
        let body = json!({"success": false, "error": "storage_error", "message": "db down"});
        let response: ApiResponse<SearchData> = serde_json::from_value(body).unwrap();

        match response.into_result() {
            Err(DispatchError::UpstreamRejected { code, message }) => {
                assert_eq!(code, ErrorCode::StorageError);
                assert_eq!(message, "db down");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_unknown_codes_are_preserved() {
        let body = json!({"success": false, "error": "rate_limited", "message": "slow down"});
        let response: ApiResponse<SearchData> = serde_json::from_value(body).unwrap();
        assert_eq!(
            response,
            ApiResponse::Failure {
                code: ErrorCode::Other("rate_limited".to_string()),
                message: "slow down".to_string()
            }
        );
    }

    #[test]
    fn test_success_without_data_is_rejected() {
        let result: std::result::Result<ApiResponse<SearchData>, _> =
            serde_json::from_value(json!({"success": true}));
        assert!(result.is_err());
    }
}
