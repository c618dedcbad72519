//! # JWT Authentication
//!
//! Riders authenticate with an HS256 bearer token. A token is accepted when
//! its signature verifies, it has not expired, it carries
//! `authenticated: true` and it names the rider in `user_id` (or `sub`).

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// JWT authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Missing Authorization header")]
    MissingAuthHeader,

    #[error("Invalid or expired token")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("user_id or sub claim is required in JWT")]
    MissingRiderId,

    #[error("User not authenticated")]
    NotAuthenticated,
}

/// Claims read from a rider token
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiderClaims {
    #[serde(default)]
    pub authenticated: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// Expiration time (Unix timestamp). Checked when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

impl RiderClaims {
    /// Claims for an authenticated rider
    pub fn for_rider(rider_id: impl Into<String>) -> Self {
        Self {
            authenticated: true,
            user_id: Some(rider_id.into()),
            ..Self::default()
        }
    }

    pub fn expiring_at(mut self, exp: u64) -> Self {
        self.exp = Some(exp);
        self
    }

    /// `user_id`, falling back to `sub`
    pub fn rider_id(&self) -> Option<&str> {
        self.user_id
            .as_deref()
            .or(self.sub.as_deref())
            .filter(|id| !id.trim().is_empty())
    }
}

/// Rider identity attached to authenticated requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedRider {
    pub id: String,
}

/// Verifies rider tokens signed with the shared secret
#[derive(Clone)]
pub struct JwtAuthenticator {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl JwtAuthenticator {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.required_spec_claims.clear();
        validation.validate_aud = false;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Validate a raw token and resolve the rider it belongs to
    pub fn authenticate(&self, token: &str) -> Result<AuthenticatedRider, AuthError> {
        let claims = decode::<RiderClaims>(token, &self.decoding_key, &self.validation)?.claims;

        let id = claims.rider_id().ok_or(AuthError::MissingRiderId)?.to_string();
        if !claims.authenticated {
            return Err(AuthError::NotAuthenticated);
        }

        Ok(AuthenticatedRider { id })
    }
}

/// Sign claims with the shared secret
pub fn issue_token(secret: &str, claims: &RiderClaims) -> Result<String, AuthError> {
    Ok(encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

fn extract_bearer_token(header: &str) -> &str {
    let header = header.trim();
    header
        .strip_prefix("Bearer ")
        .or_else(|| header.strip_prefix("bearer "))
        .unwrap_or(header)
        .trim()
}

/// Authentication middleware for the match endpoint
pub async fn require_rider(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(extract_bearer_token)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingAuthHeader)?;

    let rider = state.authenticator.authenticate(token).map_err(|e| {
        warn!(path = %request.uri().path(), error = %e, "Rejected rider token");
        e
    })?;

    debug!(rider_id = %rider.id, "Authenticated rider request");
    request.extensions_mut().insert(rider);

    Ok(next.run(request).await)
}
