//! Idempotency gate
//!
//! At-most-once admission for mutating requests carrying an
//! `X-Idempotency-Key`. First processing persists the response; later
//! submissions with the same key replay it byte-identically until the
//! record expires. The same key with a different body is a conflict,
//! never served from the wrong cache entry.

use crate::models::IdempotencyRecord;
use chrono::{Duration, Utc};
use gateway_core::error::{GatewayError, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use tracing::info;

/// SHA-256 over `method:endpoint:body`
pub fn request_hash(method: &str, endpoint: &str, body: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(method.as_bytes());
    hasher.update(b":");
    hasher.update(endpoint.as_bytes());
    hasher.update(b":");
    hasher.update(body.as_bytes());
    hex::encode(hasher.finalize())
}

/// Admission decision
#[derive(Debug)]
pub enum Admission {
    /// First sighting (or an expired record): process downstream
    Proceed,
    /// Fresh record with a matching hash: replay without touching
    /// downstream
    Replay(IdempotencyRecord),
}

pub struct IdempotencyGate {
    pool: PgPool,
    ttl_hours: i64,
}

impl IdempotencyGate {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            ttl_hours: gateway_core::DEFAULT_IDEMPOTENCY_TTL_HOURS,
        }
    }

    /// Admission check for `(tenant, key)`
    pub async fn check(
        &self,
        tenant_id: &str,
        key: &str,
        method: &str,
        endpoint: &str,
        body: &str,
    ) -> Result<Admission> {
        let record = sqlx::query_as::<_, IdempotencyRecord>(
            r#"
            SELECT idempotency_key, tenant_id, endpoint, method, request_hash,
                   response_status, response_body, processed_at, expires_at
            FROM idempotency_keys
            WHERE tenant_id = $1 AND idempotency_key = $2
            "#,
        )
        .bind(tenant_id)
        .bind(key)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| GatewayError::Internal(format!("idempotency lookup failed: {}", e)))?;

        let record = match record {
            Some(record) => record,
            None => return Ok(Admission::Proceed),
        };

        if record.expires_at < Utc::now() {
            sqlx::query(
                "DELETE FROM idempotency_keys WHERE tenant_id = $1 AND idempotency_key = $2",
            )
            .bind(tenant_id)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(|e| GatewayError::Internal(format!("idempotency purge failed: {}", e)))?;
            return Ok(Admission::Proceed);
        }

        if record.request_hash == request_hash(method, endpoint, body) {
            info!(tenant = tenant_id, key, "replaying idempotent response");
            Ok(Admission::Replay(record))
        } else {
            Err(GatewayError::IdempotencyConflict {
                key: key.to_string(),
            })
        }
    }

    /// Persist the response of the first successful processing
    pub async fn store(
        &self,
        tenant_id: &str,
        key: &str,
        method: &str,
        endpoint: &str,
        body: &str,
        response_status: i32,
        response_body: &Value,
    ) -> Result<()> {
        let now = Utc::now();
        sqlx::query(
            r#"
            INSERT INTO idempotency_keys (
                idempotency_key, tenant_id, endpoint, method, request_hash,
                response_status, response_body, processed_at, expires_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT (tenant_id, idempotency_key) DO NOTHING
            "#,
        )
        .bind(key)
        .bind(tenant_id)
        .bind(endpoint)
        .bind(method)
        .bind(request_hash(method, endpoint, body))
        .bind(response_status)
        .bind(response_body)
        .bind(now)
        .bind(now + Duration::hours(self.ttl_hours))
        .execute(&self.pool)
        .await
        .map_err(|e| GatewayError::Internal(format!("idempotency store failed: {}", e)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_deterministic_and_sensitive() {
        let a = request_hash("POST", "/api/v1/payments/credit-transfer", "{\"a\":1}");
        let b = request_hash("POST", "/api/v1/payments/credit-transfer", "{\"a\":1}");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);

        // Any component flips the hash
        assert_ne!(
            a,
            request_hash("PUT", "/api/v1/payments/credit-transfer", "{\"a\":1}")
        );
        assert_ne!(a, request_hash("POST", "/api/v1/payments/reversal", "{\"a\":1}"));
        assert_ne!(
            a,
            request_hash("POST", "/api/v1/payments/credit-transfer", "{\"a\":2}")
        );
    }

    #[test]
    fn test_hash_separator_prevents_ambiguity() {
        // method+endpoint boundaries must not collide
        assert_ne!(request_hash("POST", "/ab", "c"), request_hash("POST", "/a", "bc"));
    }
}
