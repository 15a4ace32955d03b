//! Domain events emitted by the clearing-adapter aggregate
//!
//! Events accumulate on the aggregate and are drained by the caller
//! after each mutation; they are never replayed.

use crate::types::{AdapterConfiguration, ClearingNetwork, MessageDirection};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Typed domain event, one variant per aggregate intent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    ClearingAdapterCreated {
        adapter_id: Uuid,
        tenant_id: String,
        name: String,
        network: ClearingNetwork,
        endpoint: String,
        occurred_at: DateTime<Utc>,
    },
    ClearingRouteAdded {
        adapter_id: Uuid,
        route_id: Uuid,
        name: String,
        source: String,
        destination: String,
        priority: i32,
        occurred_at: DateTime<Utc>,
    },
    ClearingMessageLogged {
        adapter_id: Uuid,
        log_id: Uuid,
        direction: MessageDirection,
        message_type: String,
        correlation_id: String,
        occurred_at: DateTime<Utc>,
    },
    ClearingAdapterConfigurationUpdated {
        adapter_id: Uuid,
        configuration: AdapterConfiguration,
        occurred_at: DateTime<Utc>,
    },
    ClearingAdapterActivated {
        adapter_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
    ClearingAdapterDeactivated {
        adapter_id: Uuid,
        occurred_at: DateTime<Utc>,
    },
}

impl DomainEvent {
    /// The adapter the event belongs to
    pub fn adapter_id(&self) -> Uuid {
        match self {
            DomainEvent::ClearingAdapterCreated { adapter_id, .. }
            | DomainEvent::ClearingRouteAdded { adapter_id, .. }
            | DomainEvent::ClearingMessageLogged { adapter_id, .. }
            | DomainEvent::ClearingAdapterConfigurationUpdated { adapter_id, .. }
            | DomainEvent::ClearingAdapterActivated { adapter_id, .. }
            | DomainEvent::ClearingAdapterDeactivated { adapter_id, .. } => *adapter_id,
        }
    }

    /// Stable name for logs and the outbox table
    pub fn event_type(&self) -> &'static str {
        match self {
            DomainEvent::ClearingAdapterCreated { .. } => "ClearingAdapterCreated",
            DomainEvent::ClearingRouteAdded { .. } => "ClearingRouteAdded",
            DomainEvent::ClearingMessageLogged { .. } => "ClearingMessageLogged",
            DomainEvent::ClearingAdapterConfigurationUpdated { .. } => {
                "ClearingAdapterConfigurationUpdated"
            }
            DomainEvent::ClearingAdapterActivated { .. } => "ClearingAdapterActivated",
            DomainEvent::ClearingAdapterDeactivated { .. } => "ClearingAdapterDeactivated",
        }
    }
}
