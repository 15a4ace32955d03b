//! Per-service health status
//!
//! One writer per key (whichever path most recently recorded a call),
//! lock-free reads. Dashboards may read eventually-consistent state;
//! admission decisions consult the circuit breaker directly, never this.

use crate::circuit_breaker::CircuitState;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

/// Health classification for one service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthState {
    /// Last call succeeded
    Healthy,
    /// Recent failures below the unavailability threshold
    Degraded,
    /// Three or more consecutive failures
    Unavailable,
}

/// Consecutive failures at which a service becomes unavailable
const UNAVAILABLE_AFTER: u32 = 3;

/// Live view of the protection machinery for one service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub circuit_state: CircuitState,
    pub failure_rate: f64,
    pub bulkhead_free_slots: usize,
    pub rate_limiter_ready: bool,
}

/// Health record for one service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceHealthStatus {
    pub service_name: String,
    pub status: HealthState,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_error_message: Option<String>,
    pub consecutive_failures: u32,
    pub metrics: Option<MetricsSnapshot>,
}

impl ServiceHealthStatus {
    fn new(service_name: &str) -> Self {
        Self {
            service_name: service_name.to_string(),
            status: HealthState::Healthy,
            last_success_at: None,
            last_failure_at: None,
            last_error_message: None,
            consecutive_failures: 0,
            metrics: None,
        }
    }
}

/// Process-wide health map
pub struct HealthRegistry {
    services: DashMap<String, ServiceHealthStatus>,
}

impl HealthRegistry {
    pub fn new() -> Self {
        Self {
            services: DashMap::new(),
        }
    }

    /// Record a successful call: healthy, counter reset
    pub fn record_success(&self, service_name: &str) {
        let mut entry = self
            .services
            .entry(service_name.to_string())
            .or_insert_with(|| ServiceHealthStatus::new(service_name));
        entry.status = HealthState::Healthy;
        entry.consecutive_failures = 0;
        entry.last_success_at = Some(Utc::now());
        entry.last_error_message = None;
    }

    /// Record a failed call: degraded until three in a row, then unavailable
    pub fn record_failure(&self, service_name: &str, error_message: &str) {
        let mut entry = self
            .services
            .entry(service_name.to_string())
            .or_insert_with(|| ServiceHealthStatus::new(service_name));
        entry.consecutive_failures += 1;
        entry.status = if entry.consecutive_failures < UNAVAILABLE_AFTER {
            HealthState::Degraded
        } else {
            HealthState::Unavailable
        };
        entry.last_failure_at = Some(Utc::now());
        entry.last_error_message = Some(error_message.to_string());
    }

    /// Attach a fresh metrics snapshot
    pub fn set_metrics(&self, service_name: &str, snapshot: MetricsSnapshot) {
        let mut entry = self
            .services
            .entry(service_name.to_string())
            .or_insert_with(|| ServiceHealthStatus::new(service_name));
        entry.metrics = Some(snapshot);
    }

    /// Current record, if the service has been seen
    pub fn get(&self, service_name: &str) -> Option<ServiceHealthStatus> {
        self.services.get(service_name).map(|e| e.clone())
    }

    /// All known records
    pub fn all(&self) -> Vec<ServiceHealthStatus> {
        self.services.iter().map(|e| e.clone()).collect()
    }
}

impl Default for HealthRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_failures_reach_unavailable() {
        let registry = HealthRegistry::new();
        registry.record_failure("samos-adapter", "connect refused");
        assert_eq!(
            registry.get("samos-adapter").unwrap().status,
            HealthState::Degraded
        );
        registry.record_failure("samos-adapter", "connect refused");
        assert_eq!(
            registry.get("samos-adapter").unwrap().status,
            HealthState::Degraded
        );
        registry.record_failure("samos-adapter", "connect refused");
        let status = registry.get("samos-adapter").unwrap();
        assert_eq!(status.status, HealthState::Unavailable);
        assert_eq!(status.consecutive_failures, 3);
    }

    #[test]
    fn test_success_resets() {
        let registry = HealthRegistry::new();
        for _ in 0..5 {
            registry.record_failure("samos-adapter", "boom");
        }
        registry.record_success("samos-adapter");
        let status = registry.get("samos-adapter").unwrap();
        assert_eq!(status.status, HealthState::Healthy);
        assert_eq!(status.consecutive_failures, 0);
        assert!(status.last_error_message.is_none());
        assert!(status.last_success_at.is_some());
    }
}
