//! Gateway error taxonomy
//!
//! One typed kind per failure class. The resiliency executor is the only
//! component that classifies transport errors into these kinds; everything
//! upstream propagates them unchanged.

use thiserror::Error;

/// Result type for gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// Gateway errors
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// Structural or schema violation on an inbound message
    #[error("Validation failed at {field_path}: {message}")]
    ValidationFailed {
        /// Offending field path (ISO 20022 short-tag form)
        field_path: String,
        /// Violation detail
        message: String,
    },

    /// Same idempotency key presented with a different request body
    #[error("Idempotency conflict for key {key}: request hash differs from original")]
    IdempotencyConflict {
        /// The idempotency key
        key: String,
    },

    /// Malformed or unknown tenant identifier
    #[error("Invalid tenant: {tenant_id}")]
    TenantInvalid {
        /// The rejected value
        tenant_id: String,
    },

    /// Router found no clearing adapter for the request
    #[error("No route available for tenant {tenant_id}, payment type {payment_type}")]
    NoRouteAvailable {
        /// Tenant
        tenant_id: String,
        /// Payment type
        payment_type: String,
    },

    /// Destination schema requires a field the source cannot supply
    #[error("Transformation requires missing field {field_path}")]
    TransformationRequired {
        /// Required destination field path
        field_path: String,
    },

    /// Circuit open or bulkhead exhausted for the target service
    #[error("Adapter unavailable for service {service}: {reason}")]
    AdapterUnavailable {
        /// Service name
        service: String,
        /// Why admission was refused
        reason: String,
    },

    /// Time limiter expired before the call completed
    #[error("Timeout after {seconds}s calling {service}")]
    Timeout {
        /// Service name
        service: String,
        /// Configured limit
        seconds: u64,
    },

    /// Scheme returned an explicit business rejection
    #[error("Scheme rejected message: {reason_code} {reason}")]
    SchemeRejected {
        /// ISO reason code (e.g. AC04)
        reason_code: String,
        /// Narrative
        reason: String,
    },

    /// Rate-limiter admission refused
    #[error("Resource exhausted for service {service}: rate limit")]
    ResourceExhausted {
        /// Service name
        service: String,
    },

    /// Inbound message with no matching in-flight correlation
    #[error("Orphan response: no correlation for uetr={uetr:?}, orig_msg_id={original_message_id:?}")]
    OrphanResponse {
        /// UETR carried by the inbound, if any
        uetr: Option<String>,
        /// Original message id carried by the inbound, if any
        original_message_id: Option<String>,
    },

    /// Uncategorized failure
    #[error("Internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// Stable kind tag used in logs, metrics labels and failure bodies
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::ValidationFailed { .. } => "ValidationFailed",
            GatewayError::IdempotencyConflict { .. } => "IdempotencyConflict",
            GatewayError::TenantInvalid { .. } => "TenantInvalid",
            GatewayError::NoRouteAvailable { .. } => "NoRouteAvailable",
            GatewayError::TransformationRequired { .. } => "TransformationRequired",
            GatewayError::AdapterUnavailable { .. } => "AdapterUnavailable",
            GatewayError::Timeout { .. } => "Timeout",
            GatewayError::SchemeRejected { .. } => "SchemeRejected",
            GatewayError::ResourceExhausted { .. } => "ResourceExhausted",
            GatewayError::OrphanResponse { .. } => "OrphanResponse",
            GatewayError::Internal(_) => "Internal",
        }
    }

    /// Whether a retry (immediate or deferred to the queue) may succeed
    pub fn retryable(&self) -> bool {
        matches!(
            self,
            GatewayError::AdapterUnavailable { .. }
                | GatewayError::Timeout { .. }
                | GatewayError::ResourceExhausted { .. }
        )
    }

    /// HTTP status surfaced at the boundary
    pub fn http_status(&self) -> u16 {
        match self {
            GatewayError::ValidationFailed { .. } => 400,
            GatewayError::TenantInvalid { .. } => 400,
            GatewayError::IdempotencyConflict { .. } => 409,
            GatewayError::TransformationRequired { .. } => 422,
            GatewayError::SchemeRejected { .. } => 422,
            GatewayError::ResourceExhausted { .. } => 429,
            GatewayError::Internal(_) => 500,
            GatewayError::NoRouteAvailable { .. } => 503,
            GatewayError::AdapterUnavailable { .. } => 503,
            GatewayError::Timeout { .. } => 504,
            // Orphans are accepted for operator review, not failed back
            GatewayError::OrphanResponse { .. } => 202,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(GatewayError::Timeout {
            service: "samos-adapter".to_string(),
            seconds: 30
        }
        .retryable());
        assert!(GatewayError::AdapterUnavailable {
            service: "samos-adapter".to_string(),
            reason: "circuit open".to_string()
        }
        .retryable());
        assert!(GatewayError::ResourceExhausted {
            service: "samos-adapter".to_string()
        }
        .retryable());

        assert!(!GatewayError::ValidationFailed {
            field_path: "GrpHdr/MsgId".to_string(),
            message: "missing".to_string()
        }
        .retryable());
        assert!(!GatewayError::IdempotencyConflict {
            key: "K1".to_string()
        }
        .retryable());
        assert!(!GatewayError::SchemeRejected {
            reason_code: "AC04".to_string(),
            reason: "closed account".to_string()
        }
        .retryable());
    }

    #[test]
    fn test_http_status_mapping() {
        assert_eq!(
            GatewayError::IdempotencyConflict { key: "K1".into() }.http_status(),
            409
        );
        assert_eq!(
            GatewayError::NoRouteAvailable {
                tenant_id: "acme".into(),
                payment_type: "RTC".into()
            }
            .http_status(),
            503
        );
        assert_eq!(
            GatewayError::Timeout {
                service: "samos-adapter".into(),
                seconds: 30
            }
            .http_status(),
            504
        );
        assert_eq!(
            GatewayError::OrphanResponse {
                uetr: None,
                original_message_id: Some("MSG-1".into())
            }
            .http_status(),
            202
        );
    }
}
