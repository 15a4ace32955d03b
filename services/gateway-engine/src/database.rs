//! Datastore access: pool construction, flow records, UETR journey,
//! adapter catalog loading.

use crate::config::DatabaseConfig;
use crate::models::{FlowRecord, FlowStatus, UetrJourneyEntry};
use adapters::{AdapterStatus, ClearingAdapter, ClearingNetwork, ClearingRoute, RouteStatus};
use chrono::{DateTime, Utc};
use gateway_core::error::{GatewayError, Result};
use gateway_core::tenant::TenantContext;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

/// Build the shared connection pool
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .connect(&config.url)
        .await
        .map_err(|e| GatewayError::Internal(format!("database connection failed: {}", e)))
}

fn db_err(context: &str, e: sqlx::Error) -> GatewayError {
    GatewayError::Internal(format!("{}: {}", context, e))
}

/// Flow records plus the per-UETR journey
#[derive(Clone)]
pub struct FlowRepository {
    pool: PgPool,
}

impl FlowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Insert or update the record at its current state
    pub async fn save(&self, record: &FlowRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO flow_records (
                correlation_id, uetr, tenant_id, direction, original_message_type,
                transformed_message_type, clearing_system_code, transaction_id,
                status, processing_started_at, processing_completed_at,
                processing_time_ms, metadata
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            ON CONFLICT (correlation_id) DO UPDATE SET
                transformed_message_type = EXCLUDED.transformed_message_type,
                clearing_system_code = EXCLUDED.clearing_system_code,
                transaction_id = EXCLUDED.transaction_id,
                status = EXCLUDED.status,
                processing_completed_at = EXCLUDED.processing_completed_at,
                processing_time_ms = EXCLUDED.processing_time_ms,
                metadata = EXCLUDED.metadata
            "#,
        )
        .bind(record.correlation_id)
        .bind(&record.uetr)
        .bind(&record.tenant_id)
        .bind(record.direction.as_str())
        .bind(&record.original_message_type)
        .bind(&record.transformed_message_type)
        .bind(&record.clearing_system_code)
        .bind(&record.transaction_id)
        .bind(record.status.as_str())
        .bind(record.processing_started_at)
        .bind(record.processing_completed_at)
        .bind(record.processing_time_ms)
        .bind(&record.metadata)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("flow record save failed", e))?;
        Ok(())
    }

    /// Terminalize a flow found by correlation id
    pub async fn complete_by_correlation(
        &self,
        correlation_id: Uuid,
        status: FlowStatus,
    ) -> Result<()> {
        let now: DateTime<Utc> = Utc::now();
        sqlx::query(
            r#"
            UPDATE flow_records SET
                status = $2,
                processing_completed_at = $3,
                processing_time_ms = (EXTRACT(EPOCH FROM ($3 - processing_started_at)) * 1000)::BIGINT
            WHERE correlation_id = $1
              AND status NOT IN ('SUCCESS', 'FAILED', 'TIMED_OUT', 'QUEUED')
            "#,
        )
        .bind(correlation_id)
        .bind(status.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("flow completion failed", e))?;
        Ok(())
    }

    /// Append a journey step for the admin UETR lookup
    pub async fn record_journey(
        &self,
        uetr: &str,
        correlation_id: Uuid,
        status: &str,
        detail: Option<&str>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO uetr_tracking (uetr, correlation_id, status, detail, recorded_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(uetr)
        .bind(correlation_id)
        .bind(status)
        .bind(detail)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("journey append failed", e))?;
        Ok(())
    }

    /// Full journey of one UETR, oldest first
    pub async fn journey(&self, uetr: &str) -> Result<Vec<UetrJourneyEntry>> {
        sqlx::query_as::<_, UetrJourneyEntry>(
            r#"
            SELECT uetr, correlation_id, status, detail, recorded_at
            FROM uetr_tracking
            WHERE uetr = $1
            ORDER BY recorded_at ASC
            "#,
        )
        .bind(uetr)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("journey lookup failed", e))
    }
}

/// One row of the per-service resiliency configuration
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ResiliencyConfigRow {
    pub service_name: String,
    /// `ResiliencyPolicy` as JSON
    pub policy: serde_json::Value,
    pub health_check_method: Option<String>,
    pub health_check_endpoint: Option<String>,
    /// Accepted health-check statuses; empty means any 2xx
    pub expected_statuses: Option<Vec<i32>>,
}

/// Loads per-service policies and health-check configuration
#[derive(Clone)]
pub struct ResiliencyConfigRepository {
    pool: PgPool,
}

impl ResiliencyConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn load_all(&self) -> Result<Vec<ResiliencyConfigRow>> {
        sqlx::query_as::<_, ResiliencyConfigRow>(
            r#"
            SELECT service_name, policy, health_check_method,
                   health_check_endpoint, expected_statuses
            FROM resiliency_configurations
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("resiliency configuration load failed", e))
    }
}

/// Append-only persistence of scheme message logs
#[derive(Clone)]
pub struct MessageLogRepository {
    pool: PgPool,
}

impl MessageLogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn append(&self, log: &adapters::ClearingMessageLog) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO clearing_message_logs (
                log_id, adapter_id, direction, message_type,
                correlation_id, payload_hash, logged_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(log.log_id)
        .bind(log.adapter_id)
        .bind(log.direction.as_str())
        .bind(&log.message_type)
        .bind(&log.correlation_id)
        .bind(&log.payload_hash)
        .bind(log.logged_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("message log append failed", e))?;
        Ok(())
    }
}

/// Row shapes for adapter catalog loading
#[derive(Debug, sqlx::FromRow)]
struct AdapterRow {
    adapter_id: Uuid,
    tenant_id: String,
    name: String,
    network: String,
    status: String,
    endpoint: String,
    api_version: String,
    timeout_seconds: i64,
    retry_attempts: i32,
    encryption_enabled: bool,
}

#[derive(Debug, sqlx::FromRow)]
struct RouteRow {
    route_id: Uuid,
    adapter_id: Uuid,
    name: String,
    source: String,
    destination: String,
    priority: i32,
    status: String,
}

fn network_of(value: &str) -> ClearingNetwork {
    match value {
        "SAMOS" => ClearingNetwork::Samos,
        "BANKSERV" => ClearingNetwork::Bankserv,
        "RTC" => ClearingNetwork::Rtc,
        "PAYSHAP" => ClearingNetwork::Payshap,
        "SWIFT" => ClearingNetwork::Swift,
        _ => ClearingNetwork::Other,
    }
}

/// Loads the clearing-adapter configuration into aggregates
#[derive(Clone)]
pub struct AdapterRepository {
    pool: PgPool,
}

impl AdapterRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn load_all(&self) -> Result<Vec<ClearingAdapter>> {
        let adapter_rows = sqlx::query_as::<_, AdapterRow>(
            r#"
            SELECT adapter_id, tenant_id, name, network, status, endpoint,
                   api_version, timeout_seconds, retry_attempts, encryption_enabled
            FROM clearing_adapters
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("adapter load failed", e))?;

        let route_rows = sqlx::query_as::<_, RouteRow>(
            r#"
            SELECT route_id, adapter_id, name, source, destination, priority, status
            FROM clearing_routes
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("route load failed", e))?;

        let mut adapters_out = Vec::with_capacity(adapter_rows.len());
        for row in adapter_rows {
            let tenant = TenantContext::new(&row.tenant_id)?;
            let routes: Vec<ClearingRoute> = route_rows
                .iter()
                .filter(|r| r.adapter_id == row.adapter_id)
                .map(|r| ClearingRoute {
                    route_id: r.route_id,
                    adapter_id: r.adapter_id,
                    name: r.name.clone(),
                    source: r.source.clone(),
                    destination: r.destination.clone(),
                    priority: r.priority,
                    status: if r.status == "ACTIVE" {
                        RouteStatus::Active
                    } else {
                        RouteStatus::Inactive
                    },
                })
                .collect();

            adapters_out.push(ClearingAdapter::rehydrate(
                row.adapter_id,
                tenant,
                row.name,
                network_of(&row.network),
                if row.status == "ACTIVE" {
                    AdapterStatus::Active
                } else {
                    AdapterStatus::Inactive
                },
                row.endpoint,
                row.api_version,
                row.timeout_seconds.max(0) as u64,
                row.retry_attempts.max(0) as u32,
                row.encryption_enabled,
                routes,
            ));
        }
        Ok(adapters_out)
    }
}
