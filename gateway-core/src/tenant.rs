//! Tenant context
//!
//! Bound at ingress, dropped at egress, and passed explicitly through the
//! call chain. Not a thread-local: ambient globals leak across requests
//! under cooperative scheduling.

use crate::error::{GatewayError, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref TENANT_ID_RE: Regex = Regex::new(r"^[A-Za-z0-9_-]{1,50}$").unwrap();
}

/// Fallback tenant when no identifier is supplied anywhere
pub const DEFAULT_TENANT: &str = "default";

/// Per-request tenant binding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    /// Tenant identifier
    pub tenant_id: String,
    /// Optional business unit within the tenant
    pub business_unit: Option<String>,
}

impl TenantContext {
    /// Validate and bind a tenant identifier
    pub fn new(tenant_id: impl Into<String>) -> Result<Self> {
        let tenant_id = tenant_id.into();
        if !TENANT_ID_RE.is_match(&tenant_id) {
            return Err(GatewayError::TenantInvalid { tenant_id });
        }
        Ok(Self {
            tenant_id,
            business_unit: None,
        })
    }

    /// Bind with a business unit
    pub fn with_business_unit(mut self, business_unit: impl Into<String>) -> Result<Self> {
        let business_unit = business_unit.into();
        if !TENANT_ID_RE.is_match(&business_unit) {
            return Err(GatewayError::TenantInvalid {
                tenant_id: business_unit,
            });
        }
        self.business_unit = Some(business_unit);
        Ok(self)
    }

    /// The fallback context
    pub fn fallback() -> Self {
        Self {
            tenant_id: DEFAULT_TENANT.to_string(),
            business_unit: None,
        }
    }

    /// Syntactic check without constructing a context
    pub fn is_valid_id(candidate: &str) -> bool {
        TENANT_ID_RE.is_match(candidate)
    }
}

impl std::fmt::Display for TenantContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.business_unit {
            Some(bu) => write!(f, "{}/{}", self.tenant_id, bu),
            None => write!(f, "{}", self.tenant_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_tenant_ids() {
        assert!(TenantContext::new("acme").is_ok());
        assert!(TenantContext::new("ACME_bank-01").is_ok());
        assert!(TenantContext::new("a").is_ok());
        assert!(TenantContext::new("a".repeat(50)).is_ok());
    }

    #[test]
    fn test_invalid_tenant_ids() {
        assert!(TenantContext::new("").is_err());
        assert!(TenantContext::new("a".repeat(51)).is_err());
        assert!(TenantContext::new("acme bank").is_err());
        assert!(TenantContext::new("acme/retail").is_err());
        assert!(TenantContext::new("acme\u{00e9}").is_err());
    }

    #[test]
    fn test_business_unit() {
        let ctx = TenantContext::new("acme")
            .unwrap()
            .with_business_unit("retail")
            .unwrap();
        assert_eq!(ctx.to_string(), "acme/retail");
        assert!(TenantContext::new("acme")
            .unwrap()
            .with_business_unit("re tail")
            .is_err());
    }

    #[test]
    fn test_fallback() {
        let ctx = TenantContext::fallback();
        assert_eq!(ctx.tenant_id, "default");
        assert!(ctx.business_unit.is_none());
    }
}
