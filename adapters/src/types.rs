//! Shared types for clearing adapters

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Clearing network a scheme adapter fronts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClearingNetwork {
    /// SAMOS RTGS
    Samos,
    /// BankservAfrica EFT
    Bankserv,
    /// Real-Time Clearing
    Rtc,
    /// PayShap rapid payments
    Payshap,
    /// SWIFT network
    Swift,
    /// Bank-specific or proprietary
    Other,
}

impl std::fmt::Display for ClearingNetwork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClearingNetwork::Samos => write!(f, "SAMOS"),
            ClearingNetwork::Bankserv => write!(f, "BANKSERV"),
            ClearingNetwork::Rtc => write!(f, "RTC"),
            ClearingNetwork::Payshap => write!(f, "PAYSHAP"),
            ClearingNetwork::Swift => write!(f, "SWIFT"),
            ClearingNetwork::Other => write!(f, "OTHER"),
        }
    }
}

/// Adapter lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdapterStatus {
    Active,
    Inactive,
}

/// Route lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteStatus {
    Active,
    Inactive,
}

/// Direction of a logged scheme message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageDirection {
    Outbound,
    Inbound,
}

impl MessageDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageDirection::Outbound => "OUTBOUND",
            MessageDirection::Inbound => "INBOUND",
        }
    }
}

/// Serialization dialect on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WireFormat {
    Json,
    Xml,
}

impl WireFormat {
    pub fn content_type(&self) -> &'static str {
        match self {
            WireFormat::Json => "application/json",
            WireFormat::Xml => "application/xml",
        }
    }
}

/// Append-only record of one scheme message through an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingMessageLog {
    pub log_id: Uuid,
    pub adapter_id: Uuid,
    pub direction: MessageDirection,
    pub message_type: String,
    pub correlation_id: String,
    /// SHA-256 of the payload; the payload itself stays out of the log
    pub payload_hash: String,
    pub logged_at: DateTime<Utc>,
}

/// Mutable configuration slice of an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdapterConfiguration {
    pub endpoint: String,
    pub api_version: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub encryption_enabled: bool,
}
