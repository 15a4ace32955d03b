//! Payment router
//!
//! Same-bank transfers settle internally (SYNC / JSON, no clearing
//! system). Everything else goes out through a clearing adapter chosen
//! by `(tenant, payment type, destination bank code)`. No default route:
//! an unmatched other-bank payment fails with `NoRouteAvailable`.

use crate::catalog::{AdapterCatalog, RouteMatch};
use crate::models::{PaymentRouting, ProcessingMode, RoutingType};
use adapters::{ClearingNetwork, WireFormat};
use gateway_core::error::{GatewayError, Result};
use gateway_core::tenant::TenantContext;
use std::sync::Arc;

/// Router decision plus the matched adapter for dispatch
#[derive(Debug, Clone)]
pub struct RouteDecision {
    pub routing: PaymentRouting,
    /// Absent on the same-bank path
    pub matched: Option<RouteMatch>,
}

pub struct Router {
    catalog: Arc<AdapterCatalog>,
}

impl Router {
    pub fn new(catalog: Arc<AdapterCatalog>) -> Self {
        Self { catalog }
    }

    /// Route one payment
    pub fn route(
        &self,
        tenant: &TenantContext,
        from_account: Option<&str>,
        to_account: Option<&str>,
        payment_type: &str,
        local_instrument: Option<&str>,
    ) -> Result<RouteDecision> {
        if let (Some(from), Some(to)) = (from_account, to_account) {
            if from == to {
                return Err(GatewayError::ValidationFailed {
                    field_path: "CdtTrfTxInf/CdtrAcct".to_string(),
                    message: "debtor and creditor account are identical".to_string(),
                });
            }
        }

        let from_bank = from_account.and_then(bank_code_of);
        let to_bank = to_account.and_then(bank_code_of);

        if let (Some(from_bank), Some(to_bank)) = (&from_bank, &to_bank) {
            if from_bank == to_bank {
                return Ok(RouteDecision {
                    routing: PaymentRouting {
                        routing_type: RoutingType::SameBank,
                        clearing_system_code: None,
                        local_instrumentation_code: local_instrument.map(|s| s.to_string()),
                        payment_type: payment_type.to_string(),
                        processing_mode: ProcessingMode::Sync,
                        message_format: WireFormat::Json,
                        description: format!("same-bank transfer within {}", from_bank),
                    },
                    matched: None,
                });
            }
        }

        let network = network_for(payment_type);
        let to_bank = to_bank.ok_or_else(|| GatewayError::ValidationFailed {
            field_path: "CdtTrfTxInf/CdtrAcct/Id".to_string(),
            message: "creditor account carries no resolvable bank code".to_string(),
        })?;

        let matched = self
            .catalog
            .select(&tenant.tenant_id, network, &to_bank)
            .ok_or_else(|| GatewayError::NoRouteAvailable {
                tenant_id: tenant.tenant_id.clone(),
                payment_type: payment_type.to_string(),
            })?;

        Ok(RouteDecision {
            routing: PaymentRouting {
                routing_type: RoutingType::OtherBank,
                clearing_system_code: Some(matched.adapter.network.to_string()),
                local_instrumentation_code: local_instrument.map(|s| s.to_string()),
                payment_type: payment_type.to_string(),
                processing_mode: ProcessingMode::Async,
                message_format: WireFormat::Xml,
                description: format!(
                    "other-bank transfer to {} via {}",
                    to_bank, matched.adapter.name
                ),
            },
            matched: Some(matched),
        })
    }
}

impl Router {
    /// Route a follow-up message (cancellation, reversal, status
    /// request): no accounts to compare, the scheme adapter for the
    /// payment type carries it.
    pub fn route_followup(
        &self,
        tenant: &TenantContext,
        payment_type: &str,
        local_instrument: Option<&str>,
    ) -> Result<RouteDecision> {
        let network = network_for(payment_type);
        let matched = self
            .catalog
            .select_any(&tenant.tenant_id, network)
            .ok_or_else(|| GatewayError::NoRouteAvailable {
                tenant_id: tenant.tenant_id.clone(),
                payment_type: payment_type.to_string(),
            })?;

        Ok(RouteDecision {
            routing: PaymentRouting {
                routing_type: RoutingType::OtherBank,
                clearing_system_code: Some(matched.adapter.network.to_string()),
                local_instrumentation_code: local_instrument.map(|s| s.to_string()),
                payment_type: payment_type.to_string(),
                processing_mode: ProcessingMode::Async,
                message_format: WireFormat::Xml,
                description: format!("follow-up message via {}", matched.adapter.name),
            },
            matched: Some(matched),
        })
    }
}

/// Map a payment type onto the clearing network that carries it
pub fn network_for(payment_type: &str) -> ClearingNetwork {
    match payment_type.to_ascii_uppercase().as_str() {
        "RTGS" | "HIGH_VALUE" => ClearingNetwork::Samos,
        "EFT" | "BATCH" => ClearingNetwork::Bankserv,
        "RTC" | "REALTIME" => ClearingNetwork::Rtc,
        "PAYSHAP" | "RPP" => ClearingNetwork::Payshap,
        "SWIFT" | "CROSS_BORDER" => ClearingNetwork::Swift,
        _ => ClearingNetwork::Other,
    }
}

/// Bank code of an account identifier.
///
/// IBAN: the 4-character bank identifier after the country and check
/// digits. Domestic account numbers: the 6-digit branch prefix.
pub fn bank_code_of(account: &str) -> Option<String> {
    let account = account.trim();
    if account.len() >= 12
        && account[..2].chars().all(|c| c.is_ascii_alphabetic())
        && account[2..4].chars().all(|c| c.is_ascii_digit())
    {
        return Some(account[4..8].to_ascii_uppercase());
    }
    if account.len() >= 6 && account.chars().all(|c| c.is_ascii_digit()) {
        return Some(account[..6].to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::active_adapter;

    fn router_with_samos() -> Router {
        let catalog = Arc::new(AdapterCatalog::new());
        catalog.register(active_adapter(
            "acme",
            "samos",
            ClearingNetwork::Samos,
            "BARC",
            1,
        ));
        Router::new(catalog)
    }

    fn tenant() -> TenantContext {
        TenantContext::new("acme").unwrap()
    }

    #[test]
    fn test_bank_code_extraction() {
        assert_eq!(
            bank_code_of("GB29NWBK60161331926819").as_deref(),
            Some("NWBK")
        );
        assert_eq!(bank_code_of("632005123456").as_deref(), Some("632005"));
        assert_eq!(bank_code_of("x"), None);
    }

    #[test]
    fn test_same_bank_decision() {
        let router = router_with_samos();
        let decision = router
            .route(
                &tenant(),
                Some("GB29NWBK60161331926819"),
                Some("GB11NWBK60161331926820"),
                "RTGS",
                None,
            )
            .unwrap();
        assert_eq!(decision.routing.routing_type, RoutingType::SameBank);
        assert_eq!(decision.routing.processing_mode, ProcessingMode::Sync);
        assert_eq!(decision.routing.message_format, WireFormat::Json);
        assert!(decision.routing.clearing_system_code.is_none());
        assert!(decision.matched.is_none());
    }

    #[test]
    fn test_other_bank_selects_adapter() {
        let router = router_with_samos();
        let decision = router
            .route(
                &tenant(),
                Some("GB29NWBK60161331926819"),
                Some("GB94BARC10201530093459"),
                "RTGS",
                Some("SDVA"),
            )
            .unwrap();
        assert_eq!(decision.routing.routing_type, RoutingType::OtherBank);
        assert_eq!(decision.routing.processing_mode, ProcessingMode::Async);
        assert_eq!(decision.routing.message_format, WireFormat::Xml);
        assert_eq!(decision.routing.clearing_system_code.as_deref(), Some("SAMOS"));
        assert_eq!(decision.matched.unwrap().adapter.name, "samos");
    }

    #[test]
    fn test_no_route_available() {
        let router = router_with_samos();
        // PayShap payment type with only a SAMOS adapter configured
        let err = router
            .route(
                &tenant(),
                Some("GB29NWBK60161331926819"),
                Some("GB94BARC10201530093459"),
                "PAYSHAP",
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "NoRouteAvailable");
        assert_eq!(err.http_status(), 503);
    }

    #[test]
    fn test_identical_accounts_rejected() {
        let router = router_with_samos();
        let err = router
            .route(
                &tenant(),
                Some("GB29NWBK60161331926819"),
                Some("GB29NWBK60161331926819"),
                "RTGS",
                None,
            )
            .unwrap_err();
        assert_eq!(err.kind(), "ValidationFailed");
    }
}
