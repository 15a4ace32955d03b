//! Per-service resiliency policies and their registry

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Circuit breaker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Failure rate (percent) that opens the circuit
    pub failure_rate_threshold: f64,
    /// Number of recent calls considered
    pub sliding_window_size: usize,
    /// Calls observed before the rate is evaluated
    pub minimum_number_of_calls: usize,
    /// Seconds spent open before trialing half-open
    pub wait_duration_seconds: u64,
    /// Trial calls admitted in half-open
    pub permitted_calls_in_half_open: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_rate_threshold: 50.0,
            sliding_window_size: 20,
            minimum_number_of_calls: 5,
            wait_duration_seconds: 30,
            permitted_calls_in_half_open: 5,
        }
    }
}

/// Retry backoff strategy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BackoffStrategy {
    /// Same wait between attempts
    Fixed,
    /// Wait doubles by `multiplier` up to `cap_millis`
    Exponential { multiplier: f64, cap_millis: u64 },
}

/// Retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts including the first call
    pub max_attempts: u32,
    /// Base wait between attempts
    pub wait_millis: u64,
    /// Backoff strategy
    pub backoff: BackoffStrategy,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            wait_millis: 500,
            backoff: BackoffStrategy::Fixed,
        }
    }
}

/// Time limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeLimiterConfig {
    /// Deadline over the whole composed call
    pub timeout_seconds: u64,
}

impl Default for TimeLimiterConfig {
    fn default() -> Self {
        Self { timeout_seconds: 30 }
    }
}

/// Bulkhead configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkheadConfig {
    /// Concurrent in-flight calls admitted
    pub max_concurrent_calls: usize,
    /// How long an admission may queue
    pub max_wait_millis: u64,
}

impl Default for BulkheadConfig {
    fn default() -> Self {
        Self {
            max_concurrent_calls: 20,
            max_wait_millis: 2_000,
        }
    }
}

/// Rate limiter configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimiterConfig {
    /// Permits refreshed per second
    pub limit_per_second: u32,
    /// How long acquisition may wait
    pub acquisition_timeout_millis: u64,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            limit_per_second: 100,
            acquisition_timeout_millis: 500,
        }
    }
}

/// The full policy applied to one service name
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResiliencyPolicy {
    pub circuit_breaker: CircuitBreakerConfig,
    pub retry: RetryConfig,
    pub time_limiter: TimeLimiterConfig,
    pub bulkhead: BulkheadConfig,
    pub rate_limiter: RateLimiterConfig,
}

impl ResiliencyPolicy {
    /// Deadline of the time limiter as a Duration
    pub fn deadline(&self) -> Duration {
        Duration::from_secs(self.time_limiter.timeout_seconds)
    }
}

/// Registry of configured per-service policies.
///
/// Resolution order: exact name, then case-insensitive
/// alphanumeric-normalized `contains`, then the registry default. The
/// resolved policy is cached until administrative invalidation.
pub struct PolicyRegistry {
    configured: HashMap<String, ResiliencyPolicy>,
    default_policy: ResiliencyPolicy,
    cache: DashMap<String, ResiliencyPolicy>,
}

impl PolicyRegistry {
    pub fn new(
        configured: HashMap<String, ResiliencyPolicy>,
        default_policy: ResiliencyPolicy,
    ) -> Self {
        Self {
            configured,
            default_policy,
            cache: DashMap::new(),
        }
    }

    /// Registry with only the built-in defaults
    pub fn with_defaults() -> Self {
        Self::new(HashMap::new(), ResiliencyPolicy::default())
    }

    /// Resolve the policy for a service name
    pub fn resolve(&self, service_name: &str) -> ResiliencyPolicy {
        if let Some(cached) = self.cache.get(service_name) {
            return cached.clone();
        }

        let resolved = self
            .configured
            .get(service_name)
            .cloned()
            .or_else(|| self.fuzzy_match(service_name))
            .unwrap_or_else(|| self.default_policy.clone());

        self.cache
            .insert(service_name.to_string(), resolved.clone());
        resolved
    }

    fn fuzzy_match(&self, service_name: &str) -> Option<ResiliencyPolicy> {
        let needle = normalize(service_name);
        self.configured
            .iter()
            .find(|(name, _)| {
                let candidate = normalize(name);
                candidate.contains(&needle) || needle.contains(&candidate)
            })
            .map(|(_, policy)| policy.clone())
    }

    /// Drop every cached resolution
    pub fn invalidate(&self) {
        self.cache.clear();
    }
}

fn normalize(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry_with(name: &str, attempts: u32) -> PolicyRegistry {
        let mut configured = HashMap::new();
        let mut policy = ResiliencyPolicy::default();
        policy.retry.max_attempts = attempts;
        configured.insert(name.to_string(), policy);
        PolicyRegistry::new(configured, ResiliencyPolicy::default())
    }

    #[test]
    fn test_defaults_match_contract() {
        let policy = ResiliencyPolicy::default();
        assert_eq!(policy.circuit_breaker.failure_rate_threshold, 50.0);
        assert_eq!(policy.circuit_breaker.sliding_window_size, 20);
        assert_eq!(policy.circuit_breaker.minimum_number_of_calls, 5);
        assert_eq!(policy.circuit_breaker.wait_duration_seconds, 30);
        assert_eq!(policy.circuit_breaker.permitted_calls_in_half_open, 5);
        assert_eq!(policy.retry.max_attempts, 3);
        assert_eq!(policy.retry.wait_millis, 500);
        assert_eq!(policy.time_limiter.timeout_seconds, 30);
        assert_eq!(policy.bulkhead.max_concurrent_calls, 20);
        assert_eq!(policy.bulkhead.max_wait_millis, 2_000);
        assert_eq!(policy.rate_limiter.limit_per_second, 100);
        assert_eq!(policy.rate_limiter.acquisition_timeout_millis, 500);
    }

    #[test]
    fn test_exact_match_preferred() {
        let registry = registry_with("samos-adapter", 7);
        assert_eq!(registry.resolve("samos-adapter").retry.max_attempts, 7);
    }

    #[test]
    fn test_fuzzy_match_normalized_contains() {
        let registry = registry_with("samos-adapter", 7);
        assert_eq!(registry.resolve("SAMOS_ADAPTER").retry.max_attempts, 7);
        assert_eq!(registry.resolve("SamosAdapterV2").retry.max_attempts, 7);
        assert_eq!(registry.resolve("samos").retry.max_attempts, 7);
    }

    #[test]
    fn test_unknown_falls_back_to_default() {
        let registry = registry_with("samos-adapter", 7);
        assert_eq!(registry.resolve("payshap").retry.max_attempts, 3);
    }

    #[test]
    fn test_cache_until_invalidation() {
        let registry = registry_with("samos-adapter", 7);
        let _ = registry.resolve("samos");
        assert!(registry.cache.contains_key("samos"));
        registry.invalidate();
        assert!(registry.cache.is_empty());
    }
}
