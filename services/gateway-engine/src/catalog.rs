//! In-memory catalog of per-tenant clearing adapters
//!
//! Loaded from the datastore at startup, refreshed by the admin surface.
//! The router consults it on every other-bank decision.

use adapters::{AdapterStatus, ClearingAdapter, ClearingNetwork, ClearingRoute, RouteStatus};
use parking_lot::RwLock;
use uuid::Uuid;

/// One matched candidate: the adapter and the route that won
#[derive(Debug, Clone)]
pub struct RouteMatch {
    pub adapter: ClearingAdapter,
    pub route_id: Uuid,
    pub priority: i32,
}

/// Catalog of active clearing adapters
pub struct AdapterCatalog {
    adapters: RwLock<Vec<ClearingAdapter>>,
}

impl AdapterCatalog {
    pub fn new() -> Self {
        Self {
            adapters: RwLock::new(Vec::new()),
        }
    }

    /// Replace the catalog contents (startup load, admin refresh)
    pub fn replace(&self, adapters: Vec<ClearingAdapter>) {
        *self.adapters.write() = adapters;
    }

    /// Register one adapter
    pub fn register(&self, adapter: ClearingAdapter) {
        self.adapters.write().push(adapter);
    }

    /// Active adapters for a tenant
    pub fn for_tenant(&self, tenant_id: &str) -> Vec<ClearingAdapter> {
        self.adapters
            .read()
            .iter()
            .filter(|a| a.tenant.tenant_id == tenant_id && a.status == AdapterStatus::Active)
            .cloned()
            .collect()
    }

    /// Every active adapter across tenants (health polling)
    pub fn all_active(&self) -> Vec<ClearingAdapter> {
        self.adapters
            .read()
            .iter()
            .filter(|a| a.status == AdapterStatus::Active)
            .cloned()
            .collect()
    }

    /// Best candidate for `(tenant, network, destination bank code)`.
    /// Lowest route priority wins; ties break on route id.
    pub fn select(
        &self,
        tenant_id: &str,
        network: ClearingNetwork,
        destination_bank_code: &str,
    ) -> Option<RouteMatch> {
        let adapters = self.adapters.read();
        let mut best: Option<(ClearingRoute, &ClearingAdapter)> = None;
        for adapter in adapters
            .iter()
            .filter(|a| {
                a.tenant.tenant_id == tenant_id
                    && a.status == AdapterStatus::Active
                    && a.network == network
            })
        {
            for route in adapter.routes().iter().filter(|r| {
                r.status == RouteStatus::Active && r.destination == destination_bank_code
            }) {
                let better = match &best {
                    None => true,
                    Some((current, _)) => {
                        (route.priority, route.route_id) < (current.priority, current.route_id)
                    }
                };
                if better {
                    best = Some((route.clone(), adapter));
                }
            }
        }
        best.map(|(route, adapter)| RouteMatch {
            adapter: adapter.clone(),
            route_id: route.route_id,
            priority: route.priority,
        })
    }

    /// Best candidate for `(tenant, network)` across all destinations.
    /// Follow-up messages (cancellations, status requests) carry no
    /// account, so they route to the scheme itself.
    pub fn select_any(&self, tenant_id: &str, network: ClearingNetwork) -> Option<RouteMatch> {
        let adapters = self.adapters.read();
        let mut best: Option<(ClearingRoute, &ClearingAdapter)> = None;
        for adapter in adapters.iter().filter(|a| {
            a.tenant.tenant_id == tenant_id
                && a.status == AdapterStatus::Active
                && a.network == network
        }) {
            for route in adapter
                .routes()
                .iter()
                .filter(|r| r.status == RouteStatus::Active)
            {
                let better = match &best {
                    None => true,
                    Some((current, _)) => {
                        (route.priority, route.route_id) < (current.priority, current.route_id)
                    }
                };
                if better {
                    best = Some((route.clone(), adapter));
                }
            }
        }
        best.map(|(route, adapter)| RouteMatch {
            adapter: adapter.clone(),
            route_id: route.route_id,
            priority: route.priority,
        })
    }
}

impl Default for AdapterCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub mod fixtures {
    use super::*;
    use gateway_core::tenant::TenantContext;

    /// An active adapter with one route to the given bank code
    pub fn active_adapter(
        tenant: &str,
        name: &str,
        network: ClearingNetwork,
        bank_code: &str,
        priority: i32,
    ) -> ClearingAdapter {
        let mut adapter = ClearingAdapter::create(
            TenantContext::new(tenant).unwrap(),
            name,
            network,
            format!("https://{}.example.test/api", name),
        )
        .unwrap();
        adapter
            .add_route(format!("{}-route", name), "*", bank_code, priority)
            .unwrap();
        adapter.activate().unwrap();
        adapter.take_events();
        adapter
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_prefers_lowest_priority() {
        let catalog = AdapterCatalog::new();
        catalog.register(fixtures::active_adapter(
            "acme",
            "samos-slow",
            ClearingNetwork::Samos,
            "632005",
            10,
        ));
        catalog.register(fixtures::active_adapter(
            "acme",
            "samos",
            ClearingNetwork::Samos,
            "632005",
            1,
        ));

        let matched = catalog.select("acme", ClearingNetwork::Samos, "632005").unwrap();
        assert_eq!(matched.adapter.name, "samos");
        assert_eq!(matched.priority, 1);
    }

    #[test]
    fn test_select_scopes_by_tenant_and_network() {
        let catalog = AdapterCatalog::new();
        catalog.register(fixtures::active_adapter(
            "acme",
            "samos",
            ClearingNetwork::Samos,
            "632005",
            1,
        ));

        assert!(catalog.select("globex", ClearingNetwork::Samos, "632005").is_none());
        assert!(catalog.select("acme", ClearingNetwork::Payshap, "632005").is_none());
        assert!(catalog.select("acme", ClearingNetwork::Samos, "470010").is_none());
    }

    #[test]
    fn test_inactive_adapters_invisible() {
        let catalog = AdapterCatalog::new();
        let mut adapter = fixtures::active_adapter(
            "acme",
            "samos",
            ClearingNetwork::Samos,
            "632005",
            1,
        );
        adapter.deactivate().unwrap();
        catalog.register(adapter);
        assert!(catalog.select("acme", ClearingNetwork::Samos, "632005").is_none());
        assert!(catalog.all_active().is_empty());
    }
}
