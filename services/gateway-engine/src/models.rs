//! Engine data model: flow records, queued messages, idempotency
//! records, routing decisions.

use chrono::{DateTime, Utc};
use gateway_core::error::GatewayError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Direction of a flow through the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowDirection {
    ClientToScheme,
    SchemeToClient,
}

impl FlowDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowDirection::ClientToScheme => "CLIENT_TO_SCHEME",
            FlowDirection::SchemeToClient => "SCHEME_TO_CLIENT",
        }
    }
}

/// Flow lifecycle status. Immutable once terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FlowStatus {
    Initiated,
    Transformed,
    Dispatched,
    AwaitingResponse,
    Success,
    Failed,
    TimedOut,
    Queued,
}

impl FlowStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlowStatus::Initiated => "INITIATED",
            FlowStatus::Transformed => "TRANSFORMED",
            FlowStatus::Dispatched => "DISPATCHED",
            FlowStatus::AwaitingResponse => "AWAITING_RESPONSE",
            FlowStatus::Success => "SUCCESS",
            FlowStatus::Failed => "FAILED",
            FlowStatus::TimedOut => "TIMED_OUT",
            FlowStatus::Queued => "QUEUED",
        }
    }

    /// Terminal statuses freeze the record
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            FlowStatus::Success | FlowStatus::Failed | FlowStatus::TimedOut | FlowStatus::Queued
        )
    }
}

/// One record per inbound request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRecord {
    pub correlation_id: Uuid,
    pub uetr: String,
    pub tenant_id: String,
    pub direction: FlowDirection,
    pub original_message_type: String,
    pub transformed_message_type: Option<String>,
    pub clearing_system_code: Option<String>,
    pub transaction_id: Option<String>,
    pub status: FlowStatus,
    pub processing_started_at: DateTime<Utc>,
    pub processing_completed_at: Option<DateTime<Utc>>,
    pub processing_time_ms: Option<i64>,
    pub metadata: Value,
}

impl FlowRecord {
    pub fn open(
        uetr: impl Into<String>,
        tenant_id: impl Into<String>,
        direction: FlowDirection,
        original_message_type: impl Into<String>,
    ) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            uetr: uetr.into(),
            tenant_id: tenant_id.into(),
            direction,
            original_message_type: original_message_type.into(),
            transformed_message_type: None,
            clearing_system_code: None,
            transaction_id: None,
            status: FlowStatus::Initiated,
            processing_started_at: Utc::now(),
            processing_completed_at: None,
            processing_time_ms: None,
            metadata: Value::Null,
        }
    }

    /// Terminalize, stamping completion time and duration
    pub fn complete(&mut self, status: FlowStatus) {
        let now = Utc::now();
        self.status = status;
        self.processing_completed_at = Some(now);
        self.processing_time_ms =
            Some((now - self.processing_started_at).num_milliseconds());
    }
}

/// How the client wants the scheme answer delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ResponseMode {
    Immediate,
    Async,
}

impl Default for ResponseMode {
    fn default() -> Self {
        ResponseMode::Async
    }
}

/// Routing family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutingType {
    SameBank,
    OtherBank,
}

/// Processing mode chosen by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProcessingMode {
    Sync,
    Async,
}

/// The router's decision for one payment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRouting {
    pub routing_type: RoutingType,
    pub clearing_system_code: Option<String>,
    pub local_instrumentation_code: Option<String>,
    pub payment_type: String,
    pub processing_mode: ProcessingMode,
    pub message_format: adapters::WireFormat,
    pub description: String,
}

/// Result of one flow through the engine
#[derive(Debug, Clone, Serialize)]
pub struct MessageFlowResult {
    pub message_id: String,
    pub correlation_id: Uuid,
    pub uetr: String,
    pub status: FlowStatus,
    pub clearing_system_code: Option<String>,
    pub transaction_id: Option<String>,
    pub transformed_message: Option<Value>,
    pub clearing_system_response: Option<Value>,
    pub client_response: Option<Value>,
    pub processing_time_ms: i64,
    pub metadata: Value,
    /// Set when the flow terminated on a classified failure
    #[serde(skip_serializing)]
    pub error: Option<GatewayError>,
}

/// Queued-message lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    Pending,
    InFlight,
    Failed,
    Expired,
    Done,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "PENDING",
            QueueStatus::InFlight => "IN_FLIGHT",
            QueueStatus::Failed => "FAILED",
            QueueStatus::Expired => "EXPIRED",
            QueueStatus::Done => "DONE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(QueueStatus::Pending),
            "IN_FLIGHT" => Some(QueueStatus::InFlight),
            "FAILED" => Some(QueueStatus::Failed),
            "EXPIRED" => Some(QueueStatus::Expired),
            "DONE" => Some(QueueStatus::Done),
            _ => None,
        }
    }
}

/// Durable buffer row for messages deferred by downstream failure
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QueuedMessage {
    pub message_id: Uuid,
    pub tenant_id: String,
    pub service_name: String,
    pub payload: Value,
    pub status: String,
    pub retry_count: i32,
    pub next_retry_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cached answer for an idempotent request
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IdempotencyRecord {
    pub idempotency_key: String,
    pub tenant_id: String,
    pub endpoint: String,
    pub method: String,
    pub request_hash: String,
    pub response_status: i32,
    pub response_body: Value,
    pub processed_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// One step of a UETR's journey, exposed by the admin surface
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct UetrJourneyEntry {
    pub uetr: String,
    pub correlation_id: Uuid,
    pub status: String,
    pub detail: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_record_completion() {
        let mut record = FlowRecord::open(
            "20250115-PE01-P001-1A2B-0123456789AB",
            "acme",
            FlowDirection::ClientToScheme,
            "pain.001.001.09",
        );
        assert_eq!(record.status, FlowStatus::Initiated);
        assert!(!record.status.is_terminal());

        record.complete(FlowStatus::Success);
        assert!(record.status.is_terminal());
        assert!(record.processing_completed_at.is_some());
        assert!(record.processing_time_ms.unwrap() >= 0);
    }

    #[test]
    fn test_queue_status_round_trip() {
        for status in [
            QueueStatus::Pending,
            QueueStatus::InFlight,
            QueueStatus::Failed,
            QueueStatus::Expired,
            QueueStatus::Done,
        ] {
            assert_eq!(QueueStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(QueueStatus::parse("UNKNOWN"), None);
    }
}
