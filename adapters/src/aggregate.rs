//! The clearing-adapter aggregate
//!
//! Created through the factory, mutated only through named intents.
//! Each intent appends a typed domain event. Activation of an already
//! active adapter (and deactivation of an inactive one) is an error,
//! never a silent no-op.

use crate::events::DomainEvent;
use crate::types::{
    AdapterConfiguration, AdapterStatus, ClearingMessageLog, ClearingNetwork, MessageDirection,
    RouteStatus,
};
use chrono::Utc;
use gateway_core::error::{GatewayError, Result};
use gateway_core::tenant::TenantContext;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// A route carried by one adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingRoute {
    pub route_id: Uuid,
    pub adapter_id: Uuid,
    pub name: String,
    pub source: String,
    pub destination: String,
    /// Total order; lowest wins, ties break on route_id
    pub priority: i32,
    pub status: RouteStatus,
}

/// Per-tenant configured outbound target for one clearing scheme
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClearingAdapter {
    pub adapter_id: Uuid,
    pub tenant: TenantContext,
    pub name: String,
    pub network: ClearingNetwork,
    pub status: AdapterStatus,
    pub endpoint: String,
    pub api_version: String,
    pub timeout_seconds: u64,
    pub retry_attempts: u32,
    pub encryption_enabled: bool,
    routes: Vec<ClearingRoute>,
    message_logs: Vec<ClearingMessageLog>,
    #[serde(skip)]
    pending_events: Vec<DomainEvent>,
}

impl ClearingAdapter {
    /// Factory. New adapters start inactive and carry a creation event.
    pub fn create(
        tenant: TenantContext,
        name: impl Into<String>,
        network: ClearingNetwork,
        endpoint: impl Into<String>,
    ) -> Result<Self> {
        let name = name.into();
        let endpoint = endpoint.into();
        if name.trim().is_empty() {
            return Err(GatewayError::ValidationFailed {
                field_path: "adapter/name".to_string(),
                message: "adapter name must not be blank".to_string(),
            });
        }
        if endpoint.trim().is_empty() {
            return Err(GatewayError::ValidationFailed {
                field_path: "adapter/endpoint".to_string(),
                message: "adapter endpoint must not be blank".to_string(),
            });
        }

        let adapter_id = Uuid::new_v4();
        let event = DomainEvent::ClearingAdapterCreated {
            adapter_id,
            tenant_id: tenant.tenant_id.clone(),
            name: name.clone(),
            network,
            endpoint: endpoint.clone(),
            occurred_at: Utc::now(),
        };

        Ok(Self {
            adapter_id,
            tenant,
            name,
            network,
            status: AdapterStatus::Inactive,
            endpoint,
            api_version: "1".to_string(),
            timeout_seconds: crate::DEFAULT_ADAPTER_TIMEOUT_SECONDS,
            retry_attempts: crate::DEFAULT_ADAPTER_RETRY_ATTEMPTS,
            encryption_enabled: true,
            routes: Vec::new(),
            message_logs: Vec::new(),
            pending_events: vec![event],
        })
    }

    /// Rebuild an aggregate from persisted state. No events are emitted;
    /// the history already happened.
    #[allow(clippy::too_many_arguments)]
    pub fn rehydrate(
        adapter_id: Uuid,
        tenant: TenantContext,
        name: String,
        network: ClearingNetwork,
        status: AdapterStatus,
        endpoint: String,
        api_version: String,
        timeout_seconds: u64,
        retry_attempts: u32,
        encryption_enabled: bool,
        routes: Vec<ClearingRoute>,
    ) -> Self {
        Self {
            adapter_id,
            tenant,
            name,
            network,
            status,
            endpoint,
            api_version,
            timeout_seconds,
            retry_attempts,
            encryption_enabled,
            routes,
            message_logs: Vec::new(),
            pending_events: Vec::new(),
        }
    }

    /// Add a route, returning its id
    pub fn add_route(
        &mut self,
        name: impl Into<String>,
        source: impl Into<String>,
        destination: impl Into<String>,
        priority: i32,
    ) -> Result<Uuid> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(GatewayError::ValidationFailed {
                field_path: "route/name".to_string(),
                message: "route name must not be blank".to_string(),
            });
        }
        let route = ClearingRoute {
            route_id: Uuid::new_v4(),
            adapter_id: self.adapter_id,
            name: name.clone(),
            source: source.into(),
            destination: destination.into(),
            priority,
            status: RouteStatus::Active,
        };
        let route_id = route.route_id;
        self.pending_events.push(DomainEvent::ClearingRouteAdded {
            adapter_id: self.adapter_id,
            route_id,
            name,
            source: route.source.clone(),
            destination: route.destination.clone(),
            priority,
            occurred_at: Utc::now(),
        });
        self.routes.push(route);
        Ok(route_id)
    }

    /// Replace the mutable configuration slice
    pub fn update_configuration(&mut self, configuration: AdapterConfiguration) -> Result<()> {
        if configuration.endpoint.trim().is_empty() {
            return Err(GatewayError::ValidationFailed {
                field_path: "adapter/endpoint".to_string(),
                message: "adapter endpoint must not be blank".to_string(),
            });
        }
        self.endpoint = configuration.endpoint.clone();
        self.api_version = configuration.api_version.clone();
        self.timeout_seconds = configuration.timeout_seconds;
        self.retry_attempts = configuration.retry_attempts;
        self.encryption_enabled = configuration.encryption_enabled;
        self.pending_events
            .push(DomainEvent::ClearingAdapterConfigurationUpdated {
                adapter_id: self.adapter_id,
                configuration,
                occurred_at: Utc::now(),
            });
        Ok(())
    }

    /// Activate. Fails when already active.
    pub fn activate(&mut self) -> Result<()> {
        if self.status == AdapterStatus::Active {
            return Err(GatewayError::ValidationFailed {
                field_path: "adapter/status".to_string(),
                message: format!("adapter {} is already active", self.adapter_id),
            });
        }
        self.status = AdapterStatus::Active;
        self.pending_events.push(DomainEvent::ClearingAdapterActivated {
            adapter_id: self.adapter_id,
            occurred_at: Utc::now(),
        });
        Ok(())
    }

    /// Deactivate. Fails when already inactive.
    pub fn deactivate(&mut self) -> Result<()> {
        if self.status == AdapterStatus::Inactive {
            return Err(GatewayError::ValidationFailed {
                field_path: "adapter/status".to_string(),
                message: format!("adapter {} is already inactive", self.adapter_id),
            });
        }
        self.status = AdapterStatus::Inactive;
        self.pending_events
            .push(DomainEvent::ClearingAdapterDeactivated {
                adapter_id: self.adapter_id,
                occurred_at: Utc::now(),
            });
        Ok(())
    }

    /// Append a message log entry, returning its id. The payload is
    /// hashed, never stored.
    pub fn log_message(
        &mut self,
        direction: MessageDirection,
        message_type: impl Into<String>,
        correlation_id: impl Into<String>,
        payload: &str,
    ) -> Uuid {
        let message_type = message_type.into();
        let correlation_id = correlation_id.into();
        let payload_hash = hex::encode(Sha256::digest(payload.as_bytes()));
        let log = ClearingMessageLog {
            log_id: Uuid::new_v4(),
            adapter_id: self.adapter_id,
            direction,
            message_type: message_type.clone(),
            correlation_id: correlation_id.clone(),
            payload_hash,
            logged_at: Utc::now(),
        };
        let log_id = log.log_id;
        self.pending_events.push(DomainEvent::ClearingMessageLogged {
            adapter_id: self.adapter_id,
            log_id,
            direction,
            message_type,
            correlation_id,
            occurred_at: Utc::now(),
        });
        self.message_logs.push(log);
        log_id
    }

    /// Drain pending events. Each event is observed exactly once.
    pub fn take_events(&mut self) -> Vec<DomainEvent> {
        std::mem::take(&mut self.pending_events)
    }

    /// Routes carried by this adapter
    pub fn routes(&self) -> &[ClearingRoute] {
        &self.routes
    }

    /// Message log (append-only)
    pub fn message_logs(&self) -> &[ClearingMessageLog] {
        &self.message_logs
    }

    /// Best active route toward a destination: lowest priority value,
    /// ties broken by route id
    pub fn best_route(&self, destination: &str) -> Option<&ClearingRoute> {
        self.routes
            .iter()
            .filter(|r| r.status == RouteStatus::Active && r.destination == destination)
            .min_by_key(|r| (r.priority, r.route_id))
    }

    /// Service name this adapter registers under in the resiliency plane
    pub fn service_name(&self) -> String {
        format!("{}-adapter", self.name.to_ascii_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter() -> ClearingAdapter {
        ClearingAdapter::create(
            TenantContext::new("acme").unwrap(),
            "samos",
            ClearingNetwork::Samos,
            "https://samos.example.test/api",
        )
        .unwrap()
    }

    #[test]
    fn test_factory_emits_created_event() {
        let mut adapter = adapter();
        let events = adapter.take_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].event_type(), "ClearingAdapterCreated");
        // Drained exactly once
        assert!(adapter.take_events().is_empty());
    }

    #[test]
    fn test_blank_name_or_endpoint_rejected() {
        let tenant = TenantContext::new("acme").unwrap();
        assert!(
            ClearingAdapter::create(tenant.clone(), "  ", ClearingNetwork::Rtc, "https://x").is_err()
        );
        assert!(ClearingAdapter::create(tenant, "rtc", ClearingNetwork::Rtc, "").is_err());
    }

    #[test]
    fn test_activate_twice_fails() {
        let mut adapter = adapter();
        adapter.activate().unwrap();
        let err = adapter.activate().unwrap_err();
        assert_eq!(err.kind(), "ValidationFailed");
        // State unchanged, no second event
        assert_eq!(adapter.status, AdapterStatus::Active);
        let events = adapter.take_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| e.event_type() == "ClearingAdapterActivated")
                .count(),
            1
        );
    }

    #[test]
    fn test_deactivate_inactive_fails() {
        let mut adapter = adapter();
        assert!(adapter.deactivate().is_err());
    }

    #[test]
    fn test_route_priority_order() {
        let mut adapter = adapter();
        adapter.add_route("slow", "ZA", "632005", 10).unwrap();
        adapter.add_route("fast", "ZA", "632005", 1).unwrap();
        adapter.add_route("other-dest", "ZA", "470010", 0).unwrap();

        let best = adapter.best_route("632005").unwrap();
        assert_eq!(best.name, "fast");
        assert!(adapter.best_route("999999").is_none());
    }

    #[test]
    fn test_message_log_append_only_and_hashed() {
        let mut adapter = adapter();
        adapter.log_message(
            MessageDirection::Outbound,
            "pacs.008.001.08",
            "corr-1",
            "<Document/>",
        );
        adapter.log_message(
            MessageDirection::Inbound,
            "pacs.002.001.10",
            "corr-1",
            "<Document/>",
        );
        assert_eq!(adapter.message_logs().len(), 2);
        assert_eq!(adapter.message_logs()[0].payload_hash.len(), 64);

        let events = adapter.take_events();
        assert_eq!(
            events
                .iter()
                .filter(|e| e.event_type() == "ClearingMessageLogged")
                .count(),
            2
        );
    }

    #[test]
    fn test_configuration_update() {
        let mut adapter = adapter();
        adapter
            .update_configuration(AdapterConfiguration {
                endpoint: "https://samos-dr.example.test/api".to_string(),
                api_version: "2".to_string(),
                timeout_seconds: 10,
                retry_attempts: 5,
                encryption_enabled: false,
            })
            .unwrap();
        assert_eq!(adapter.timeout_seconds, 10);
        assert!(adapter
            .take_events()
            .iter()
            .any(|e| e.event_type() == "ClearingAdapterConfigurationUpdated"));
    }

    #[test]
    fn test_service_name() {
        assert_eq!(adapter().service_name(), "samos-adapter");
    }
}
