//! The composed resiliency executor
//!
//! Every outbound call runs through the same decoration chain:
//! target call -> circuit breaker -> retry -> bulkhead -> rate limiter
//! -> time limiter. This is the only place transport errors are
//! classified into the gateway taxonomy; upstream components propagate
//! the typed errors unchanged.

use crate::bulkhead::Bulkhead;
use crate::circuit_breaker::CircuitBreakerRegistry;
use crate::health::{HealthRegistry, MetricsSnapshot, ServiceHealthStatus};
use crate::metrics;
use crate::policy::PolicyRegistry;
use crate::rate_limiter::ServiceRateLimiter;
use crate::retry;
use dashmap::DashMap;
use gateway_core::error::{GatewayError, Result};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::warn;

/// Transport-level failure reported by the target call. The executor
/// alone turns these into gateway error kinds.
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// Network-level timeout on a single attempt
    #[error("network timeout: {0}")]
    Timeout(String),

    /// Connection establishment or I/O failure
    #[error("connection error: {0}")]
    Connection(String),

    /// HTTP response outside the success range
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },

    /// Scheme-level business rejection
    #[error("scheme rejection {code}: {reason}")]
    Rejected { code: String, reason: String },

    /// Malformed outbound request; never retried
    #[error("invalid request: {0}")]
    Invalid(String),
}

impl TransportError {
    /// Transient failures worth another attempt
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Timeout(_) | TransportError::Connection(_) => true,
            TransportError::Http { status, .. } => {
                *status >= 500 || *status == 408 || *status == 429
            }
            TransportError::Rejected { .. } | TransportError::Invalid(_) => false,
        }
    }
}

fn classify(service_name: &str, error: TransportError) -> GatewayError {
    match error {
        TransportError::Timeout(detail) => GatewayError::Timeout {
            service: format!("{} ({})", service_name, detail),
            seconds: 0,
        },
        TransportError::Connection(detail) => GatewayError::AdapterUnavailable {
            service: service_name.to_string(),
            reason: detail,
        },
        TransportError::Http { status, body } => match status {
            408 => GatewayError::Timeout {
                service: service_name.to_string(),
                seconds: 0,
            },
            429 => GatewayError::ResourceExhausted {
                service: service_name.to_string(),
            },
            s if s >= 500 => GatewayError::AdapterUnavailable {
                service: service_name.to_string(),
                reason: format!("upstream {}: {}", s, body),
            },
            s => GatewayError::SchemeRejected {
                reason_code: s.to_string(),
                reason: body,
            },
        },
        TransportError::Rejected { code, reason } => GatewayError::SchemeRejected {
            reason_code: code,
            reason,
        },
        TransportError::Invalid(detail) => GatewayError::Internal(detail),
    }
}

/// Process-wide executor over every outbound scheme call
pub struct ResiliencyExecutor {
    policies: Arc<PolicyRegistry>,
    breakers: Arc<CircuitBreakerRegistry>,
    bulkheads: DashMap<String, Arc<Bulkhead>>,
    limiters: DashMap<String, Arc<ServiceRateLimiter>>,
    health: Arc<HealthRegistry>,
    accepting: AtomicBool,
}

impl ResiliencyExecutor {
    pub fn new(policies: Arc<PolicyRegistry>) -> Self {
        Self {
            policies,
            breakers: Arc::new(CircuitBreakerRegistry::new()),
            bulkheads: DashMap::new(),
            limiters: DashMap::new(),
            health: Arc::new(HealthRegistry::new()),
            accepting: AtomicBool::new(true),
        }
    }

    /// Execute `op` under the full decoration chain
    pub async fn execute<T, F, Fut>(&self, service_name: &str, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
    {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(GatewayError::AdapterUnavailable {
                service: service_name.to_string(),
                reason: "gateway shutting down".to_string(),
            });
        }

        let policy = self.policies.resolve(service_name);
        let deadline = policy.deadline();
        let bulkhead = self.bulkhead_for(service_name, &policy);
        let limiter = self.limiter_for(service_name, &policy);

        let started = Instant::now();
        let inner = async {
            limiter.acquire(service_name).await?;
            let _permit = bulkhead.acquire(service_name).await?;

            let mut attempt: u32 = 0;
            loop {
                attempt += 1;
                self.breakers
                    .try_acquire(service_name, &policy.circuit_breaker)?;

                match op().await {
                    Ok(value) => {
                        self.breakers
                            .record_success(service_name, &policy.circuit_breaker);
                        self.health.record_success(service_name);
                        return Ok(value);
                    }
                    Err(transport) => {
                        self.breakers
                            .record_failure(service_name, &policy.circuit_breaker);
                        self.health
                            .record_failure(service_name, &transport.to_string());

                        if transport.is_retryable() && attempt < policy.retry.max_attempts {
                            warn!(
                                service = service_name,
                                attempt,
                                error = %transport,
                                "retrying after transient failure"
                            );
                            tokio::time::sleep(retry::wait_before_attempt(&policy.retry, attempt))
                                .await;
                            continue;
                        }
                        return Err(classify(service_name, transport));
                    }
                }
            }
        };

        let result = match tokio::time::timeout(deadline, inner).await {
            Ok(result) => result,
            Err(_) => {
                // Deadline expiry cancels the in-flight attempt; the
                // breaker never sees a completed call, health does.
                self.health
                    .record_failure(service_name, "time limiter expired");
                Err(GatewayError::Timeout {
                    service: service_name.to_string(),
                    seconds: deadline.as_secs(),
                })
            }
        };

        let outcome = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        metrics::OUTBOUND_CALLS_TOTAL
            .with_label_values(&[service_name, outcome])
            .inc();
        metrics::OUTBOUND_CALL_DURATION
            .with_label_values(&[service_name])
            .observe(started.elapsed().as_secs_f64());
        metrics::CIRCUIT_BREAKER_STATE
            .with_label_values(&[service_name])
            .set(metrics::circuit_state_value(self.breakers.state(service_name)));

        result
    }

    /// Execute with a fallback invoked on terminal failure
    pub async fn execute_with_fallback<T, F, Fut, FB, FutB>(
        &self,
        service_name: &str,
        op: F,
        fallback: Option<FB>,
    ) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = std::result::Result<T, TransportError>>,
        FB: FnOnce(GatewayError) -> FutB,
        FutB: Future<Output = Result<T>>,
    {
        match self.execute(service_name, op).await {
            Ok(value) => Ok(value),
            Err(error) => match fallback {
                Some(fb) => fb(error).await,
                None => Err(error),
            },
        }
    }

    /// Health record with a freshly refreshed metrics snapshot
    pub fn health_snapshot(&self, service_name: &str) -> Option<ServiceHealthStatus> {
        self.refresh_metrics(service_name);
        self.health.get(service_name)
    }

    /// All health records, each with a fresh snapshot
    pub fn all_health(&self) -> Vec<ServiceHealthStatus> {
        let services: Vec<String> = self
            .health
            .all()
            .into_iter()
            .map(|s| s.service_name)
            .collect();
        services
            .iter()
            .for_each(|name| self.refresh_metrics(name));
        self.health.all()
    }

    /// Administrative circuit reset
    pub fn force_reset(&self, service_name: &str) {
        self.breakers.force_reset(service_name);
        metrics::CIRCUIT_BREAKER_STATE
            .with_label_values(&[service_name])
            .set(metrics::circuit_state_value(self.breakers.state(service_name)));
    }

    /// Circuit breaker registry (shared with the self-healing monitor)
    pub fn breakers(&self) -> Arc<CircuitBreakerRegistry> {
        self.breakers.clone()
    }

    /// Health registry (shared with the self-healing monitor)
    pub fn health(&self) -> Arc<HealthRegistry> {
        self.health.clone()
    }

    /// Policy registry
    pub fn policies(&self) -> Arc<PolicyRegistry> {
        self.policies.clone()
    }

    /// Stop admitting new calls; in-flight work continues to completion
    pub fn shutdown(&self) {
        self.accepting.store(false, Ordering::Release);
    }

    fn refresh_metrics(&self, service_name: &str) {
        let free_slots = self
            .bulkheads
            .get(service_name)
            .map(|b| b.free_slots())
            .unwrap_or(0);
        let ready = self
            .limiters
            .get(service_name)
            .map(|l| l.is_ready())
            .unwrap_or(true);
        let snapshot = MetricsSnapshot {
            circuit_state: self.breakers.state(service_name),
            failure_rate: self.breakers.failure_rate(service_name),
            bulkhead_free_slots: free_slots,
            rate_limiter_ready: ready,
        };
        metrics::BULKHEAD_FREE_SLOTS
            .with_label_values(&[service_name])
            .set(free_slots as i64);
        self.health.set_metrics(service_name, snapshot);
    }

    fn bulkhead_for(
        &self,
        service_name: &str,
        policy: &crate::policy::ResiliencyPolicy,
    ) -> Arc<Bulkhead> {
        self.bulkheads
            .entry(service_name.to_string())
            .or_insert_with(|| Arc::new(Bulkhead::new(&policy.bulkhead)))
            .clone()
    }

    fn limiter_for(
        &self,
        service_name: &str,
        policy: &crate::policy::ResiliencyPolicy,
    ) -> Arc<ServiceRateLimiter> {
        self.limiters
            .entry(service_name.to_string())
            .or_insert_with(|| Arc::new(ServiceRateLimiter::new(&policy.rate_limiter)))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit_breaker::CircuitState;
    use crate::health::HealthState;
    use crate::policy::ResiliencyPolicy;
    use std::collections::HashMap;
    use std::sync::atomic::AtomicU32;

    fn executor_with(policy: ResiliencyPolicy) -> ResiliencyExecutor {
        let mut configured = HashMap::new();
        configured.insert("svc".to_string(), policy);
        ResiliencyExecutor::new(Arc::new(PolicyRegistry::new(
            configured,
            ResiliencyPolicy::default(),
        )))
    }

    fn fast_policy() -> ResiliencyPolicy {
        let mut policy = ResiliencyPolicy::default();
        policy.retry.wait_millis = 1;
        policy.circuit_breaker.sliding_window_size = 10;
        policy.circuit_breaker.minimum_number_of_calls = 4;
        policy
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let executor = executor_with(fast_policy());
        let result = executor
            .execute("svc", || async { Ok::<_, TransportError>(7) })
            .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(
            executor.health_snapshot("svc").unwrap().status,
            HealthState::Healthy
        );
    }

    #[tokio::test]
    async fn test_transient_failures_retry_to_success() {
        let executor = executor_with(fast_policy());
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();
        let result = executor
            .execute("svc", move || {
                let calls = calls_in.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(TransportError::Http {
                            status: 502,
                            body: "bad gateway".to_string(),
                        })
                    } else {
                        Ok(99)
                    }
                }
            })
            .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_business_rejection_never_retried() {
        let executor = executor_with(fast_policy());
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();
        let result: Result<u32> = executor
            .execute("svc", move || {
                let calls = calls_in.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(TransportError::Rejected {
                        code: "AC04".to_string(),
                        reason: "closed account".to_string(),
                    })
                }
            })
            .await;
        assert_eq!(result.unwrap_err().kind(), "SchemeRejected");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_retries_count_against_breaker() {
        let executor = executor_with(fast_policy());
        // Two executions, three attempts each: six completed failures,
        // well past minimum_number_of_calls at 100% failure rate.
        for _ in 0..2 {
            let _ = executor
                .execute("svc", || async {
                    Err::<u32, _>(TransportError::Connection("refused".to_string()))
                })
                .await;
        }
        assert_eq!(executor.breakers().state("svc"), CircuitState::Open);

        // Next admission sees the open circuit
        let err = executor
            .execute("svc", || async { Ok::<_, TransportError>(1) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "AdapterUnavailable");
    }

    #[tokio::test]
    async fn test_fallback_on_terminal_failure() {
        let executor = executor_with(fast_policy());
        let result = executor
            .execute_with_fallback(
                "svc",
                || async {
                    Err::<u32, _>(TransportError::Rejected {
                        code: "AM05".to_string(),
                        reason: "duplicate".to_string(),
                    })
                },
                Some(|_e: GatewayError| async { Ok(42u32) }),
            )
            .await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_expiry_classified_as_timeout() {
        let mut policy = fast_policy();
        policy.time_limiter.timeout_seconds = 30;
        let executor = executor_with(policy);
        let result: Result<()> = executor
            .execute("svc", || async {
                tokio::time::sleep(std::time::Duration::from_secs(45)).await;
                Ok(())
            })
            .await;
        let err = result.unwrap_err();
        assert_eq!(err.kind(), "Timeout");
        // Cancelled attempt never reaches the breaker window
        assert_eq!(executor.breakers().failure_rate("svc"), 0.0);
    }

    #[tokio::test]
    async fn test_shutdown_rejects_new_admissions() {
        let executor = executor_with(fast_policy());
        executor.shutdown();
        let err = executor
            .execute("svc", || async { Ok::<_, TransportError>(1) })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "AdapterUnavailable");
    }
}
