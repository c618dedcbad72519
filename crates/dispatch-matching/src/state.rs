use std::sync::Arc;

use crate::auth::JwtAuthenticator;
use crate::resilience::CircuitBreaker;
use crate::services::MatchingService;

/// Shared application state
pub struct AppState {
    pub service: Arc<MatchingService>,
    pub authenticator: JwtAuthenticator,
    /// Breaker of the location client, reported by the health endpoint
    pub breaker: Arc<CircuitBreaker>,
}

impl AppState {
    pub fn new(
        service: Arc<MatchingService>,
        authenticator: JwtAuthenticator,
        breaker: Arc<CircuitBreaker>,
    ) -> Self {
        Self {
            service,
            authenticator,
            breaker,
        }
    }
}
