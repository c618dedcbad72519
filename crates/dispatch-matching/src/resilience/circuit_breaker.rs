//! # Circuit Breaker Implementation
//!
//! Three states: Closed (normal operation), Open (failing fast) and Half-Open
//! (admitting a bounded number of trial calls).
//!
//! Every state change starts a new generation. A call remembers the generation
//! it was admitted in and its outcome is discarded if the breaker has moved on
//! by the time it completes. A call whose future is dropped before completing
//! counts as a failure, so a cancelled trial never holds a half-open slot.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU8, Ordering};
use std::time::Instant;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::{CircuitBreakerConfig, CircuitBreakerMetrics};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - limited calls allowed to test system health
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            // Default to safest state
            _ => CircuitState::Open,
        }
    }
}

impl fmt::Display for CircuitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CircuitState::Closed => "closed",
            CircuitState::Open => "open",
            CircuitState::HalfOpen => "half_open",
        };
        f.write_str(name)
    }
}

/// Errors returned from a protected call
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// The call was refused without being attempted
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// The call was attempted and failed; the failure has been recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

#[derive(Debug)]
struct Counts {
    generation: u64,
    window_started: Instant,
    opened_at: Option<Instant>,
    window_failures: u32,
    half_open_admitted: u32,
    half_open_successes: u32,
    total_calls: u64,
    success_count: u64,
    failure_count: u64,
    rejected_count: u64,
}

/// Circuit breaker shared by every caller of one dependency
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Component name for logging
    name: String,

    /// Current state, readable without taking the lock
    state: AtomicU8,

    config: CircuitBreakerConfig,

    /// Only mutated while holding this lock, as is `state`
    counts: Mutex<Counts>,
}

impl CircuitBreaker {
    /// Create a new circuit breaker with the given name and configuration
    pub fn new(name: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        let name = name.into();
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            interval_seconds = config.interval.as_secs(),
            cooldown_seconds = config.cooldown.as_secs(),
            half_open_max_requests = config.half_open_max_requests,
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            config,
            counts: Mutex::new(Counts {
                generation: 0,
                window_started: Instant::now(),
                opened_at: None,
                window_failures: 0,
                half_open_admitted: 0,
                half_open_successes: 0,
                total_calls: 0,
                success_count: 0,
                failure_count: 0,
                rejected_count: 0,
            }),
        }
    }

    /// Current state. An open circuit whose cooldown has elapsed is reported
    /// as half-open.
    pub fn state(&self) -> CircuitState {
        let mut counts = self.counts.lock();
        self.refresh(&mut counts, Instant::now());
        self.current()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Execute an operation with circuit breaker protection
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let Some(generation) = self.admit() else {
            debug!(component = %self.name, "Call rejected by open circuit");
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        };

        let mut guard = Outcome {
            breaker: self,
            generation,
            settled: false,
        };
        let result = operation().await;
        guard.settle(result.is_ok());

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let mut counts = self.counts.lock();
        self.refresh(&mut counts, Instant::now());
        CircuitBreakerMetrics {
            state: self.current(),
            total_calls: counts.total_calls,
            success_count: counts.success_count,
            failure_count: counts.failure_count,
            rejected_count: counts.rejected_count,
            window_failures: counts.window_failures,
        }
    }

    fn current(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Reserve a slot for one call, returning the generation it belongs to
    fn admit(&self) -> Option<u64> {
        let mut counts = self.counts.lock();
        self.refresh(&mut counts, Instant::now());

        let admitted = match self.current() {
            CircuitState::Closed => true,
            CircuitState::Open => false,
            CircuitState::HalfOpen => {
                if counts.half_open_admitted < self.config.half_open_max_requests {
                    counts.half_open_admitted += 1;
                    true
                } else {
                    false
                }
            }
        };

        if admitted {
            counts.total_calls += 1;
            Some(counts.generation)
        } else {
            counts.rejected_count += 1;
            None
        }
    }

    fn record(&self, generation: u64, success: bool) {
        let now = Instant::now();
        let mut counts = self.counts.lock();
        if success {
            counts.success_count += 1;
        } else {
            counts.failure_count += 1;
        }

        self.refresh(&mut counts, now);
        if counts.generation != generation {
            debug!(component = %self.name, "Ignoring outcome from an earlier generation");
            return;
        }

        match (self.current(), success) {
            (CircuitState::Closed, true) => {}
            (CircuitState::Closed, false) => {
                counts.window_failures += 1;
                if counts.window_failures >= self.config.failure_threshold {
                    self.transition(&mut counts, CircuitState::Open, now);
                }
            }
            (CircuitState::HalfOpen, true) => {
                counts.half_open_successes += 1;
                if counts.half_open_successes >= self.config.half_open_max_requests {
                    self.transition(&mut counts, CircuitState::Closed, now);
                }
            }
            // Any failure in half-open state immediately reopens the circuit
            (CircuitState::HalfOpen, false) => {
                self.transition(&mut counts, CircuitState::Open, now);
            }
            (CircuitState::Open, _) => {}
        }
    }

    /// Apply time-driven changes: the end of a closed-state window and the
    /// end of the open-state cooldown
    fn refresh(&self, counts: &mut Counts, now: Instant) {
        match self.current() {
            CircuitState::Closed => {
                if now.duration_since(counts.window_started) >= self.config.interval {
                    counts.generation += 1;
                    counts.window_started = now;
                    counts.window_failures = 0;
                }
            }
            CircuitState::Open => {
                let cooled = counts
                    .opened_at
                    .map(|opened| now.duration_since(opened) >= self.config.cooldown)
                    .unwrap_or(true);
                if cooled {
                    self.transition(counts, CircuitState::HalfOpen, now);
                }
            }
            CircuitState::HalfOpen => {}
        }
    }

    fn transition(&self, counts: &mut Counts, to: CircuitState, now: Instant) {
        let from = self.current();
        self.state.store(to as u8, Ordering::Release);

        counts.generation += 1;
        counts.window_started = now;
        counts.window_failures = 0;
        counts.half_open_admitted = 0;
        counts.half_open_successes = 0;
        counts.opened_at = (to == CircuitState::Open).then_some(now);

        match to {
            CircuitState::Open => warn!(
                component = %self.name,
                from = %from,
                cooldown_seconds = self.config.cooldown.as_secs(),
                "🔴 Circuit breaker opened (failing fast)"
            ),
            CircuitState::HalfOpen => info!(
                component = %self.name,
                trial_requests = self.config.half_open_max_requests,
                "🟡 Circuit breaker half-open (testing recovery)"
            ),
            CircuitState::Closed => info!(
                component = %self.name,
                total_calls = counts.total_calls,
                "🟢 Circuit breaker closed (recovered)"
            ),
        }
    }
}

/// Records the outcome of an admitted call, or a failure if it is dropped first
struct Outcome<'a> {
    breaker: &'a CircuitBreaker,
    generation: u64,
    settled: bool,
}

impl Outcome<'_> {
    fn settle(&mut self, success: bool) {
        self.settled = true;
        self.breaker.record(self.generation, success);
    }
}

impl Drop for Outcome<'_> {
    fn drop(&mut self) {
        if !self.settled {
            debug!(component = %self.breaker.name, "Protected call cancelled");
            self.breaker.record(self.generation, false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::sync::watch;
    use tokio::time::sleep;

    fn config(failure_threshold: u32) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold,
            interval: Duration::from_secs(60),
            cooldown: Duration::from_millis(50),
            half_open_max_requests: 3,
        }
    }

    async fn fail(breaker: &CircuitBreaker) {
        let _ = breaker.call(|| async { Err::<(), _>("error") }).await;
    }

    async fn succeed(breaker: &CircuitBreaker) -> Result<(), CircuitBreakerError<&'static str>> {
        breaker.call(|| async { Ok::<_, &'static str>(()) }).await
    }

    #[tokio::test]
    async fn test_normal_operation() {
        let breaker = CircuitBreaker::new("test", config(3));
        assert_eq!(breaker.state(), CircuitState::Closed);

        let result = breaker.call(|| async { Ok::<_, String>("success") }).await;
        assert_eq!(result.unwrap(), "success");

        let metrics = breaker.metrics();
        assert_eq!(metrics.total_calls, 1);
        assert_eq!(metrics.success_count, 1);
        assert_eq!(metrics.failure_count, 0);
    }

    #[tokio::test]
    async fn test_opens_once_threshold_reached() {
        let breaker = CircuitBreaker::new("test", config(6));

        for _ in 0..5 {
            fail(&breaker).await;
        }
        assert_eq!(breaker.state(), CircuitState::Closed);

        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_successes_do_not_reset_window_failures() {
        let breaker = CircuitBreaker::new("test", config(3));

        fail(&breaker).await;
        succeed(&breaker).await.unwrap();
        fail(&breaker).await;
        succeed(&breaker).await.unwrap();
        fail(&breaker).await;

        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_open_circuit_fails_fast_without_calling() {
        let breaker = CircuitBreaker::new("test", config(1));
        fail(&breaker).await;

        let attempts = AtomicUsize::new(0);
        let result = breaker
            .call(|| async {
                attempts.fetch_add(1, Ordering::SeqCst);
                Ok::<_, String>(())
            })
            .await;

        assert!(matches!(result, Err(CircuitBreakerError::CircuitOpen { .. })));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
        assert_eq!(breaker.metrics().rejected_count, 1);
    }

    #[tokio::test]
    async fn test_trial_call_after_cooldown_and_recovery() {
        let breaker = CircuitBreaker::new("test", config(1));
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        sleep(Duration::from_millis(80)).await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        succeed(&breaker).await.unwrap();
        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_failure_while_half_open_reopens() {
        let breaker = CircuitBreaker::new("test", config(1));
        fail(&breaker).await;
        sleep(Duration::from_millis(80)).await;

        succeed(&breaker).await.unwrap();
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);
        assert!(matches!(
            succeed(&breaker).await,
            Err(CircuitBreakerError::CircuitOpen { .. })
        ));
    }

    #[tokio::test]
    async fn test_half_open_admits_bounded_trials() {
        let breaker = CircuitBreaker::new("test", config(1));
        fail(&breaker).await;
        sleep(Duration::from_millis(80)).await;

        let (release, gate) = watch::channel(false);
        let mut trials = Vec::new();
        for _ in 0..3 {
            let mut gate = gate.clone();
            trials.push(Box::pin(breaker.call(move || async move {
                let _ = gate.wait_for(|open| *open).await;
                Ok::<_, &'static str>(())
            })));
        }
        for trial in trials.iter_mut() {
            assert!(futures::poll!(trial.as_mut()).is_pending());
        }

        assert!(matches!(
            succeed(&breaker).await,
            Err(CircuitBreakerError::CircuitOpen { .. })
        ));

        release.send(true).unwrap();
        for trial in trials {
            trial.await.unwrap();
        }
        assert_eq!(breaker.state(), CircuitState::Closed);
    }

    #[tokio::test]
    async fn test_cancelled_trial_counts_as_failure() {
        let breaker = CircuitBreaker::new("test", config(1));
        fail(&breaker).await;
        sleep(Duration::from_millis(80)).await;

        let mut trial = Box::pin(breaker.call(|| async {
            std::future::pending::<()>().await;
            Ok::<_, &'static str>(())
        }));
        assert!(futures::poll!(trial.as_mut()).is_pending());
        drop(trial);

        assert_eq!(breaker.state(), CircuitState::Open);
    }

    #[tokio::test]
    async fn test_outcome_from_earlier_generation_is_ignored() {
        let breaker = Arc::new(CircuitBreaker::new("test", config(2)));

        let (release, gate) = watch::channel(false);
        let mut slow = Box::pin(breaker.call(move || {
            let mut gate = gate.clone();
            async move {
                let _ = gate.wait_for(|open| *open).await;
                Err::<(), _>("late failure")
            }
        }));
        assert!(futures::poll!(slow.as_mut()).is_pending());

        fail(&breaker).await;
        fail(&breaker).await;
        assert_eq!(breaker.state(), CircuitState::Open);

        sleep(Duration::from_millis(80)).await;
        succeed(&breaker).await.unwrap();
        assert_eq!(breaker.state(), CircuitState::HalfOpen);

        // The slow call was admitted while closed; its failure must not
        // reopen the half-open circuit
        release.send(true).unwrap();
        let _ = slow.await;
        assert_eq!(breaker.state(), CircuitState::HalfOpen);
    }

    #[tokio::test]
    async fn test_window_expiry_resets_failures() {
        let breaker = CircuitBreaker::new(
            "test",
            CircuitBreakerConfig {
                interval: Duration::from_millis(50),
                ..config(3)
            },
        );

        fail(&breaker).await;
        fail(&breaker).await;
        sleep(Duration::from_millis(80)).await;
        fail(&breaker).await;
        fail(&breaker).await;

        assert_eq!(breaker.state(), CircuitState::Closed);
        assert_eq!(breaker.metrics().window_failures, 2);
    }
}
