//! Self-healing monitor
//!
//! Three cooperative periodic tasks, each bounded by its own deadline:
//! health polling (2 min / 30 s), queue drain (5 min / 2 min) and
//! expired-message cleanup (60 min / 5 min). A service that comes back
//! healthy gets its health cache invalidated, its circuit force-reset
//! and its pending queue drained.

use crate::catalog::AdapterCatalog;
use crate::config::Config;
use crate::flow::{FlowRequest, MessageFlowEngine};
use crate::metrics;
use crate::models::FlowStatus;
use crate::queue_store::QueueStore;
use adapters::{ClearingAdapter, SchemeConnector};
use dashmap::DashMap;
use serde::Serialize;
use gateway_core::error::{GatewayError, Result};
use resiliency::time_limiter::with_deadline;
use resiliency::{HealthState, ResiliencyExecutor};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info, warn};

/// On-demand probe results stay fresh this long. The periodic poll is
/// never gated by this cache; it only suppresses duplicate probes from
/// on-demand queries between ticks.
const HEALTH_CACHE_TTL: Duration = Duration::from_secs(300);

/// Queue drain batch bound
const DRAIN_BATCH: i64 = 100;

/// Configured health-check request for one service
#[derive(Debug, Clone, Default)]
pub struct HealthCheckConfig {
    pub method: Option<String>,
    pub endpoint: Option<String>,
    /// Empty means any 2xx
    pub expected_statuses: Vec<u16>,
}

/// Outcome of one on-demand health check
#[derive(Debug, Clone, Serialize)]
pub struct ServiceProbe {
    pub service: String,
    pub healthy: bool,
    /// Served from the poll cache instead of a fresh probe
    pub cached: bool,
}

/// Shared state of the periodic tasks
pub struct MonitorContext {
    pub config: Arc<Config>,
    pub catalog: Arc<AdapterCatalog>,
    pub executor: Arc<ResiliencyExecutor>,
    pub queue: QueueStore,
    pub engine: Arc<MessageFlowEngine>,
    pub connector: Arc<dyn SchemeConnector>,
    /// Per-service health-check overrides from the configuration store
    health_checks: std::collections::HashMap<String, HealthCheckConfig>,
    /// Cached poll results, TTL-bounded
    health_cache: DashMap<String, (bool, Instant)>,
    /// Last observed classification per service
    last_seen: DashMap<String, HealthState>,
}

impl MonitorContext {
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<AdapterCatalog>,
        executor: Arc<ResiliencyExecutor>,
        queue: QueueStore,
        engine: Arc<MessageFlowEngine>,
        connector: Arc<dyn SchemeConnector>,
        health_checks: std::collections::HashMap<String, HealthCheckConfig>,
    ) -> Self {
        Self {
            config,
            catalog,
            executor,
            queue,
            engine,
            connector,
            health_checks,
            health_cache: DashMap::new(),
            last_seen: DashMap::new(),
        }
    }

    /// One health-poll pass: every active adapter is probed on every
    /// tick, then classified against its previous state.
    pub async fn poll_health(&self) {
        for adapter in self.catalog.all_active() {
            let service = adapter.service_name();
            let healthy = self.probe(&adapter).await;

            let health = self.executor.health();
            if healthy {
                health.record_success(&service);
            } else {
                health.record_failure(&service, "health check failed");
            }

            let current = health
                .get(&service)
                .map(|s| s.status)
                .unwrap_or(HealthState::Healthy);
            let previous = self
                .last_seen
                .insert(service.clone(), current)
                .unwrap_or(HealthState::Healthy);

            match (previous, current) {
                (HealthState::Healthy, HealthState::Degraded | HealthState::Unavailable) => {
                    warn!(service = %service, "service entered failed set");
                }
                (HealthState::Degraded | HealthState::Unavailable, HealthState::Healthy) => {
                    info!(service = %service, "service recovered");
                    self.on_recovery(&service).await;
                }
                _ => {}
            }
        }
    }

    /// Issue the configured health-check request for one adapter and
    /// refresh the on-demand cache with the outcome.
    async fn probe(&self, adapter: &ClearingAdapter) -> bool {
        let service = adapter.service_name();
        let check = self.health_checks.get(&service).cloned().unwrap_or_default();
        let method = check.method.as_deref().unwrap_or("GET").to_string();
        let endpoint = check
            .endpoint
            .clone()
            .unwrap_or_else(|| format!("{}/health", adapter.endpoint.trim_end_matches('/')));
        let deadline = Duration::from_secs(self.config.gateway.health_check_timeout_seconds);
        let probe = tokio::time::timeout(
            deadline,
            self.connector
                .health_check(&method, &endpoint, &check.expected_statuses),
        )
        .await;

        let healthy = matches!(probe, Ok(Ok(())));
        self.health_cache
            .insert(service.clone(), (healthy, Instant::now()));
        metrics::HEALTH_POLLS_TOTAL
            .with_label_values(&[&service, if healthy { "up" } else { "down" }])
            .inc();
        healthy
    }

    /// On-demand health check for one service. A result probed within
    /// the cache TTL is served as-is so dashboards cannot hammer the
    /// downstream between poll ticks. Returns `None` for a service no
    /// active adapter registers.
    pub async fn check_service(&self, service: &str) -> Option<ServiceProbe> {
        if let Some(entry) = self.health_cache.get(service) {
            if entry.1.elapsed() < HEALTH_CACHE_TTL {
                return Some(ServiceProbe {
                    service: service.to_string(),
                    healthy: entry.0,
                    cached: true,
                });
            }
        }

        let adapter = self
            .catalog
            .all_active()
            .into_iter()
            .find(|a| a.service_name() == service)?;
        let healthy = self.probe(&adapter).await;
        let health = self.executor.health();
        if healthy {
            health.record_success(service);
        } else {
            health.record_failure(service, "health check failed");
        }
        Some(ServiceProbe {
            service: service.to_string(),
            healthy,
            cached: false,
        })
    }

    /// Recovery actions: cache invalidation, circuit reset, drain
    async fn on_recovery(&self, service: &str) {
        self.health_cache.remove(service);
        self.executor.force_reset(service);
        match self.queue.reset_for_drain(service, DRAIN_BATCH).await {
            Ok(reset) if reset > 0 => {
                info!(service, reset, "scheduled queue drain after recovery");
            }
            Ok(_) => {}
            Err(e) => error!(service, "drain scheduling failed: {}", e),
        }
    }

    /// One queue-drain pass: claim due work and push it back through
    /// the flow engine.
    pub async fn drain_queue(&self) -> Result<()> {
        let claimed = self.queue.claim_due(DRAIN_BATCH).await?;
        if claimed.is_empty() {
            return Ok(());
        }
        info!(count = claimed.len(), "draining queued messages");

        for message in claimed {
            let request: FlowRequest = match serde_json::from_value(message.payload.clone()) {
                Ok(request) => request,
                Err(e) => {
                    // Unreplayable payload: park it as failed, expiry
                    // will collect it eventually
                    self.queue
                        .mark_failed(&message, &format!("payload unreadable: {}", e))
                        .await?;
                    continue;
                }
            };

            match self.engine.process_client_to_scheme(request).await {
                Ok(result)
                    if matches!(
                        result.status,
                        FlowStatus::Success | FlowStatus::AwaitingResponse
                    ) =>
                {
                    self.queue.mark_done(message.message_id).await?;
                    metrics::QUEUE_DRAINED_TOTAL
                        .with_label_values(&[&message.service_name, "done"])
                        .inc();
                }
                Ok(result) => {
                    let detail = result
                        .error
                        .map(|e| e.to_string())
                        .unwrap_or_else(|| result.status.as_str().to_string());
                    self.queue.mark_failed(&message, &detail).await?;
                    metrics::QUEUE_DRAINED_TOTAL
                        .with_label_values(&[&message.service_name, "failed"])
                        .inc();
                }
                Err(e) => {
                    self.queue.mark_failed(&message, &e.to_string()).await?;
                    metrics::QUEUE_DRAINED_TOTAL
                        .with_label_values(&[&message.service_name, "failed"])
                        .inc();
                }
            }

            if let Ok(depth) = self.queue.pending_depth(&message.service_name).await {
                metrics::QUEUE_DEPTH
                    .with_label_values(&[&message.service_name])
                    .set(depth);
            }
        }
        Ok(())
    }

    /// One cleanup pass
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let expired = self.queue.expire_overdue().await?;
        if expired > 0 {
            warn!(expired, "queued messages expired unprocessed");
        }
        Ok(expired)
    }
}

/// The scheduled monitor
pub struct SelfHealingMonitor {
    scheduler: JobScheduler,
}

impl SelfHealingMonitor {
    /// Register the three periodic tasks and start the scheduler
    pub async fn start(context: Arc<MonitorContext>) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| GatewayError::Internal(format!("scheduler init failed: {}", e)))?;

        // Health poll: every 2 minutes, 30s deadline per tick
        let ctx = context.clone();
        let health_job = Job::new_async("0 */2 * * * *", move |_uuid, _lock| {
            let ctx = ctx.clone();
            Box::pin(async move {
                let tick = async {
                    ctx.poll_health().await;
                    Ok(())
                };
                if with_deadline("health-poll", Duration::from_secs(30), tick)
                    .await
                    .is_err()
                {
                    warn!("health poll tick exceeded its 30s deadline");
                }
            })
        })
        .map_err(|e| GatewayError::Internal(format!("health job failed: {}", e)))?;
        scheduler
            .add(health_job)
            .await
            .map_err(|e| GatewayError::Internal(format!("health job add failed: {}", e)))?;

        // Queue drain: every 5 minutes, 2min deadline per tick
        let ctx = context.clone();
        let drain_job = Job::new_async("0 */5 * * * *", move |_uuid, _lock| {
            let ctx = ctx.clone();
            Box::pin(async move {
                match with_deadline("queue-drain", Duration::from_secs(120), ctx.drain_queue()).await
                {
                    Err(GatewayError::Timeout { .. }) => {
                        warn!("queue drain tick exceeded its 2min deadline")
                    }
                    Err(e) => error!("queue drain failed: {}", e),
                    Ok(()) => {}
                }
            })
        })
        .map_err(|e| GatewayError::Internal(format!("drain job failed: {}", e)))?;
        scheduler
            .add(drain_job)
            .await
            .map_err(|e| GatewayError::Internal(format!("drain job add failed: {}", e)))?;

        // Expired-message cleanup: hourly, 5min deadline per tick
        let ctx = context.clone();
        let cleanup_job = Job::new_async("0 0 * * * *", move |_uuid, _lock| {
            let ctx = ctx.clone();
            Box::pin(async move {
                match with_deadline("queue-cleanup", Duration::from_secs(300), ctx.cleanup_expired())
                    .await
                {
                    Err(GatewayError::Timeout { .. }) => {
                        warn!("cleanup tick exceeded its 5min deadline")
                    }
                    Err(e) => error!("cleanup failed: {}", e),
                    Ok(_) => {}
                }
            })
        })
        .map_err(|e| GatewayError::Internal(format!("cleanup job failed: {}", e)))?;
        scheduler
            .add(cleanup_job)
            .await
            .map_err(|e| GatewayError::Internal(format!("cleanup job add failed: {}", e)))?;

        scheduler
            .start()
            .await
            .map_err(|e| GatewayError::Internal(format!("scheduler start failed: {}", e)))?;
        info!("self-healing monitor started");

        Ok(Self { scheduler })
    }

    pub async fn stop(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| GatewayError::Internal(format!("scheduler shutdown failed: {}", e)))?;
        info!("self-healing monitor stopped");
        Ok(())
    }
}
