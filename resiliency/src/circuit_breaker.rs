//! Circuit breaker with a sliding-window failure rate
//!
//! State machine: CLOSED -> OPEN on a failure-rate breach over the last
//! `sliding_window_size` calls (once `minimum_number_of_calls` have been
//! observed), OPEN -> HALF_OPEN automatically after the wait duration,
//! HALF_OPEN -> CLOSED on the configured number of consecutive trial
//! successes, HALF_OPEN -> OPEN on any trial failure.

use crate::policy::CircuitBreakerConfig;
use dashmap::DashMap;
use gateway_core::error::{GatewayError, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    /// Normal operation
    Closed,
    /// Rejecting admissions
    Open,
    /// Trialing recovery
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "CLOSED"),
            CircuitState::Open => write!(f, "OPEN"),
            CircuitState::HalfOpen => write!(f, "HALF_OPEN"),
        }
    }
}

/// Circuit breaker for one service
#[derive(Debug)]
pub struct CircuitBreaker {
    state: CircuitState,
    /// Outcomes of the most recent calls, true = success
    window: VecDeque<bool>,
    opened_at: Option<Instant>,
    half_open_admitted: u32,
    half_open_successes: u32,
    config: CircuitBreakerConfig,
}

impl CircuitBreaker {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            state: CircuitState::Closed,
            window: VecDeque::with_capacity(config.sliding_window_size),
            opened_at: None,
            half_open_admitted: 0,
            half_open_successes: 0,
            config,
        }
    }

    /// Admission check. Open circuits transition to half-open on their own
    /// once the wait duration has elapsed.
    pub fn try_acquire(&mut self, service_name: &str) -> Result<()> {
        match self.state {
            CircuitState::Closed => Ok(()),
            CircuitState::Open => {
                let elapsed = self
                    .opened_at
                    .map(|at| at.elapsed().as_secs())
                    .unwrap_or(u64::MAX);
                if elapsed >= self.config.wait_duration_seconds {
                    info!(service = service_name, "circuit half-opening");
                    self.state = CircuitState::HalfOpen;
                    self.half_open_admitted = 1;
                    self.half_open_successes = 0;
                    Ok(())
                } else {
                    Err(GatewayError::AdapterUnavailable {
                        service: service_name.to_string(),
                        reason: format!(
                            "circuit open, retry in {}s",
                            self.config.wait_duration_seconds.saturating_sub(elapsed)
                        ),
                    })
                }
            }
            CircuitState::HalfOpen => {
                if self.half_open_admitted < self.config.permitted_calls_in_half_open {
                    self.half_open_admitted += 1;
                    Ok(())
                } else {
                    Err(GatewayError::AdapterUnavailable {
                        service: service_name.to_string(),
                        reason: "circuit half-open, trial quota exhausted".to_string(),
                    })
                }
            }
        }
    }

    /// Record a completed successful call
    pub fn record_success(&mut self, service_name: &str) {
        match self.state {
            CircuitState::Closed => self.push_outcome(true),
            CircuitState::HalfOpen => {
                self.half_open_successes += 1;
                if self.half_open_successes >= self.config.permitted_calls_in_half_open {
                    info!(service = service_name, "circuit closing after trial successes");
                    self.reset_to_closed();
                }
            }
            CircuitState::Open => {}
        }
    }

    /// Record a completed failed call
    pub fn record_failure(&mut self, service_name: &str) {
        match self.state {
            CircuitState::Closed => {
                self.push_outcome(false);
                if self.window.len() >= self.config.minimum_number_of_calls
                    && self.failure_rate() >= self.config.failure_rate_threshold
                {
                    warn!(
                        service = service_name,
                        failure_rate = self.failure_rate(),
                        "circuit opening"
                    );
                    self.state = CircuitState::Open;
                    self.opened_at = Some(Instant::now());
                }
            }
            CircuitState::HalfOpen => {
                warn!(service = service_name, "trial call failed, circuit re-opening");
                self.state = CircuitState::Open;
                self.opened_at = Some(Instant::now());
                self.half_open_admitted = 0;
                self.half_open_successes = 0;
            }
            CircuitState::Open => {}
        }
    }

    /// Failure rate (percent) over the current window
    pub fn failure_rate(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        let failures = self.window.iter().filter(|ok| !**ok).count();
        failures as f64 / self.window.len() as f64 * 100.0
    }

    /// Current state
    pub fn state(&self) -> CircuitState {
        self.state
    }

    /// Administrative reset back to closed
    pub fn force_reset(&mut self, service_name: &str) {
        info!(service = service_name, "circuit force-reset");
        self.reset_to_closed();
    }

    fn reset_to_closed(&mut self) {
        self.state = CircuitState::Closed;
        self.window.clear();
        self.opened_at = None;
        self.half_open_admitted = 0;
        self.half_open_successes = 0;
    }

    fn push_outcome(&mut self, ok: bool) {
        if self.window.len() == self.config.sliding_window_size {
            self.window.pop_front();
        }
        self.window.push_back(ok);
    }
}

/// Process-wide registry, one breaker per service name.
///
/// Counters are guarded by a per-service lock so they stay linearizable;
/// admission always consults the breaker directly.
pub struct CircuitBreakerRegistry {
    breakers: DashMap<String, Arc<Mutex<CircuitBreaker>>>,
}

impl CircuitBreakerRegistry {
    pub fn new() -> Self {
        Self {
            breakers: DashMap::new(),
        }
    }

    fn get_or_create(
        &self,
        service_name: &str,
        config: &CircuitBreakerConfig,
    ) -> Arc<Mutex<CircuitBreaker>> {
        self.breakers
            .entry(service_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(CircuitBreaker::new(config.clone()))))
            .clone()
    }

    pub fn try_acquire(&self, service_name: &str, config: &CircuitBreakerConfig) -> Result<()> {
        self.get_or_create(service_name, config)
            .lock()
            .try_acquire(service_name)
    }

    pub fn record_success(&self, service_name: &str, config: &CircuitBreakerConfig) {
        self.get_or_create(service_name, config)
            .lock()
            .record_success(service_name);
    }

    pub fn record_failure(&self, service_name: &str, config: &CircuitBreakerConfig) {
        self.get_or_create(service_name, config)
            .lock()
            .record_failure(service_name);
    }

    /// State without creating a breaker
    pub fn state(&self, service_name: &str) -> CircuitState {
        self.breakers
            .get(service_name)
            .map(|b| b.lock().state())
            .unwrap_or(CircuitState::Closed)
    }

    /// Failure rate without creating a breaker
    pub fn failure_rate(&self, service_name: &str) -> f64 {
        self.breakers
            .get(service_name)
            .map(|b| b.lock().failure_rate())
            .unwrap_or(0.0)
    }

    /// Administrative reset of one breaker
    pub fn force_reset(&self, service_name: &str) {
        if let Some(breaker) = self.breakers.get(service_name) {
            breaker.lock().force_reset(service_name);
        }
    }
}

impl Default for CircuitBreakerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_rate_threshold: 50.0,
            sliding_window_size: 10,
            minimum_number_of_calls: 5,
            wait_duration_seconds: 0,
            permitted_calls_in_half_open: 2,
        }
    }

    #[test]
    fn test_opens_on_failure_rate_breach() {
        let mut cb = CircuitBreaker::new(test_config());
        // Below minimum calls: stays closed regardless of rate
        for _ in 0..4 {
            cb.record_failure("svc");
        }
        assert_eq!(cb.state(), CircuitState::Closed);
        // Fifth failure reaches minimum with 100% failure rate
        cb.record_failure("svc");
        assert_eq!(cb.state(), CircuitState::Open);
        assert_eq!(cb.failure_rate(), 100.0);
    }

    #[test]
    fn test_stays_closed_below_threshold() {
        let mut cb = CircuitBreaker::new(test_config());
        for _ in 0..6 {
            cb.record_success("svc");
        }
        for _ in 0..4 {
            cb.record_failure("svc");
        }
        // 4 failures in 10 = 40% < 50%
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_then_close() {
        let mut cb = CircuitBreaker::new(test_config());
        for _ in 0..5 {
            cb.record_failure("svc");
        }
        assert_eq!(cb.state(), CircuitState::Open);

        // Wait duration is zero, so the next admission trials half-open
        assert!(cb.try_acquire("svc").is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_success("svc");
        assert!(cb.try_acquire("svc").is_ok());
        cb.record_success("svc");
        assert_eq!(cb.state(), CircuitState::Closed);
    }

    #[test]
    fn test_half_open_failure_reopens() {
        let mut cb = CircuitBreaker::new(test_config());
        for _ in 0..5 {
            cb.record_failure("svc");
        }
        assert!(cb.try_acquire("svc").is_ok());
        assert_eq!(cb.state(), CircuitState::HalfOpen);
        cb.record_failure("svc");
        assert_eq!(cb.state(), CircuitState::Open);
    }

    #[test]
    fn test_open_rejects_before_wait() {
        let mut config = test_config();
        config.wait_duration_seconds = 3600;
        let mut cb = CircuitBreaker::new(config);
        for _ in 0..5 {
            cb.record_failure("svc");
        }
        let err = cb.try_acquire("svc").unwrap_err();
        assert_eq!(err.kind(), "AdapterUnavailable");
    }

    #[test]
    fn test_force_reset() {
        let registry = CircuitBreakerRegistry::new();
        let config = test_config();
        for _ in 0..5 {
            registry.record_failure("samos-adapter", &config);
        }
        assert_eq!(registry.state("samos-adapter"), CircuitState::Open);
        registry.force_reset("samos-adapter");
        assert_eq!(registry.state("samos-adapter"), CircuitState::Closed);
        assert!(registry.try_acquire("samos-adapter", &config).is_ok());
    }

    #[test]
    fn test_registry_isolated_per_service() {
        let registry = CircuitBreakerRegistry::new();
        let config = test_config();
        for _ in 0..5 {
            registry.record_failure("samos-adapter", &config);
        }
        assert_eq!(registry.state("samos-adapter"), CircuitState::Open);
        assert_eq!(registry.state("payshap-adapter"), CircuitState::Closed);
        assert!(registry.try_acquire("payshap-adapter", &config).is_ok());
    }
}
