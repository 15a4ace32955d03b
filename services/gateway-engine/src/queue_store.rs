//! Queued-message store
//!
//! Durable buffer for messages deferred by downstream failure. Claiming
//! uses row-level locking so two drainers never take the same row.
//! Status machine: PENDING <-> FAILED, terminal EXPIRED and DONE; a
//! message past `expires_at` is never retried again.

use crate::models::{QueueStatus, QueuedMessage};
use chrono::{DateTime, Duration, Utc};
use gateway_core::error::{GatewayError, Result};
use serde_json::Value;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

/// Exponential backoff for a failed queued message: one minute doubling
/// per retry, capped at an hour.
pub fn next_retry_delay(retry_count: i32) -> Duration {
    let exponent = retry_count.clamp(0, 6) as u32;
    let seconds = (60u64 << exponent).min(3_600);
    Duration::seconds(seconds as i64)
}

fn db_err(context: &str, e: sqlx::Error) -> GatewayError {
    GatewayError::Internal(format!("{}: {}", context, e))
}

#[derive(Clone)]
pub struct QueueStore {
    pool: PgPool,
}

impl QueueStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Defer a message for later replay
    pub async fn enqueue(
        &self,
        tenant_id: &str,
        service_name: &str,
        payload: &Value,
        expires_at: DateTime<Utc>,
        error_message: &str,
    ) -> Result<Uuid> {
        let message_id = Uuid::new_v4();
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO queued_messages (
                message_id, tenant_id, service_name, payload, status,
                retry_count, next_retry_at, expires_at, error_message,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, 'PENDING', 0, $5, $6, $7, $5, $5)
            "#,
        )
        .bind(message_id)
        .bind(tenant_id)
        .bind(service_name)
        .bind(payload)
        .bind(now)
        .bind(expires_at)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("enqueue failed", e))?;

        info!(tenant = tenant_id, service = service_name, %message_id, "message queued");
        Ok(message_id)
    }

    /// Claim up to `limit` due messages, marking them in flight. Locked
    /// rows are skipped so concurrent drainers never collide.
    pub async fn claim_due(&self, limit: i64) -> Result<Vec<QueuedMessage>> {
        sqlx::query_as::<_, QueuedMessage>(
            r#"
            UPDATE queued_messages SET status = 'IN_FLIGHT', updated_at = NOW()
            WHERE message_id IN (
                SELECT message_id FROM queued_messages
                WHERE (status = 'FAILED' OR (status = 'PENDING' AND next_retry_at <= NOW()))
                  AND expires_at > NOW()
                ORDER BY next_retry_at ASC
                LIMIT $1
                FOR UPDATE SKIP LOCKED
            )
            RETURNING message_id, tenant_id, service_name, payload, status,
                      retry_count, next_retry_at, expires_at, error_message,
                      created_at, updated_at
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_err("queue claim failed", e))
    }

    /// Recovery drain preparation: pending work for the service becomes
    /// immediately due with a clean retry budget.
    pub async fn reset_for_drain(&self, service_name: &str, limit: i64) -> Result<u64> {
        let updated = sqlx::query(
            r#"
            UPDATE queued_messages
            SET retry_count = 0, status = 'PENDING', next_retry_at = NOW(), updated_at = NOW()
            WHERE message_id IN (
                SELECT message_id FROM queued_messages
                WHERE service_name = $1
                  AND status IN ('PENDING', 'FAILED')
                  AND expires_at > NOW()
                ORDER BY created_at ASC
                LIMIT $2
                FOR UPDATE SKIP LOCKED
            )
            "#,
        )
        .bind(service_name)
        .bind(limit)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("drain reset failed", e))?
        .rows_affected();
        if updated > 0 {
            info!(service = service_name, updated, "queued messages reset for drain");
        }
        Ok(updated)
    }

    /// Successful replay
    pub async fn mark_done(&self, message_id: Uuid) -> Result<()> {
        sqlx::query(
            "UPDATE queued_messages SET status = 'DONE', updated_at = NOW() WHERE message_id = $1",
        )
        .bind(message_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("mark done failed", e))?;
        Ok(())
    }

    /// Failed replay: exponential backoff until expiry, then EXPIRED
    pub async fn mark_failed(&self, message: &QueuedMessage, error_message: &str) -> Result<()> {
        let retry_count = message.retry_count + 1;
        let next_retry_at = Utc::now() + next_retry_delay(retry_count);
        let status = if next_retry_at >= message.expires_at {
            QueueStatus::Expired
        } else {
            QueueStatus::Failed
        };
        sqlx::query(
            r#"
            UPDATE queued_messages
            SET status = $2, retry_count = $3, next_retry_at = $4,
                error_message = $5, updated_at = NOW()
            WHERE message_id = $1
            "#,
        )
        .bind(message.message_id)
        .bind(status.as_str())
        .bind(retry_count)
        .bind(next_retry_at)
        .bind(error_message)
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("mark failed failed", e))?;
        Ok(())
    }

    /// Expire everything past its deadline. Returns the affected count.
    pub async fn expire_overdue(&self) -> Result<u64> {
        let expired = sqlx::query(
            r#"
            UPDATE queued_messages SET status = 'EXPIRED', updated_at = NOW()
            WHERE expires_at < NOW() AND status IN ('PENDING', 'FAILED', 'IN_FLIGHT')
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| db_err("expiry sweep failed", e))?
        .rows_affected();
        Ok(expired)
    }

    /// Pending depth per service (metrics)
    pub async fn pending_depth(&self, service_name: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM queued_messages WHERE service_name = $1 AND status = 'PENDING'",
        )
        .bind(service_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_err("depth query failed", e))?;
        Ok(row.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_doubles_and_caps() {
        assert_eq!(next_retry_delay(0), Duration::seconds(60));
        assert_eq!(next_retry_delay(1), Duration::seconds(120));
        assert_eq!(next_retry_delay(2), Duration::seconds(240));
        assert_eq!(next_retry_delay(5), Duration::seconds(1_920));
        // Capped at one hour from here on
        assert_eq!(next_retry_delay(6), Duration::seconds(3_600));
        assert_eq!(next_retry_delay(50), Duration::seconds(3_600));
    }
}
