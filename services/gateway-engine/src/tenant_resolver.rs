//! Tenant resolution
//!
//! Priority: `X-Tenant-ID` header, `tenantId` query parameter, the first
//! path segment after `/tenants/`, a claim inside the bearer credential,
//! then the literal `default`. An explicitly supplied but malformed
//! value is rejected rather than silently skipped.

use gateway_core::error::{GatewayError, Result};
use gateway_core::tenant::TenantContext;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

/// Everything a transport request can carry about its tenant
#[derive(Debug, Default)]
pub struct TenantHints<'a> {
    pub header: Option<&'a str>,
    pub query_param: Option<&'a str>,
    pub path: &'a str,
    pub bearer_token: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct TenantClaims {
    #[serde(alias = "tenantId", alias = "tid")]
    tenant_id: Option<String>,
}

/// Resolve the tenant context for one request
pub fn resolve(hints: &TenantHints<'_>, jwt_secret: Option<&str>) -> Result<TenantContext> {
    if let Some(value) = hints.header {
        return TenantContext::new(value);
    }
    if let Some(value) = hints.query_param {
        return TenantContext::new(value);
    }
    if let Some(value) = path_segment(hints.path) {
        return TenantContext::new(value);
    }
    if let (Some(token), Some(secret)) = (hints.bearer_token, jwt_secret) {
        if let Some(value) = claim_tenant(token, secret) {
            return TenantContext::new(value);
        }
    }
    Ok(TenantContext::fallback())
}

/// The first path segment after `/tenants/`
fn path_segment(path: &str) -> Option<&str> {
    let rest = path.split("/tenants/").nth(1)?;
    let segment = rest.split('/').next()?;
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

fn claim_tenant(token: &str, secret: &str) -> Option<String> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.validate_exp = false;
    validation.required_spec_claims.clear();
    decode::<TenantClaims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .ok()
        .and_then(|data| data.claims.tenant_id)
}

/// Validate an explicit tenant header on its own (idempotency pathway)
pub fn validate_explicit(value: &str) -> Result<TenantContext> {
    TenantContext::new(value).map_err(|_| GatewayError::TenantInvalid {
        tenant_id: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn token_with_tenant(tenant: &str, secret: &str) -> String {
        encode(
            &Header::default(),
            &json!({ "tenantId": tenant }),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_header_wins() {
        let hints = TenantHints {
            header: Some("acme"),
            query_param: Some("globex"),
            path: "/tenants/initech/payments",
            bearer_token: None,
        };
        assert_eq!(resolve(&hints, None).unwrap().tenant_id, "acme");
    }

    #[test]
    fn test_query_param_second() {
        let hints = TenantHints {
            header: None,
            query_param: Some("globex"),
            path: "/tenants/initech/payments",
            bearer_token: None,
        };
        assert_eq!(resolve(&hints, None).unwrap().tenant_id, "globex");
    }

    #[test]
    fn test_path_segment_third() {
        let hints = TenantHints {
            header: None,
            query_param: None,
            path: "/tenants/initech/payments",
            bearer_token: None,
        };
        assert_eq!(resolve(&hints, None).unwrap().tenant_id, "initech");
    }

    #[test]
    fn test_jwt_claim_fourth() {
        let token = token_with_tenant("claimed", "s3cret");
        let hints = TenantHints {
            header: None,
            query_param: None,
            path: "/api/v1/payments",
            bearer_token: Some(&token),
        };
        assert_eq!(
            resolve(&hints, Some("s3cret")).unwrap().tenant_id,
            "claimed"
        );
    }

    #[test]
    fn test_wrong_jwt_secret_falls_through_to_default() {
        let token = token_with_tenant("claimed", "s3cret");
        let hints = TenantHints {
            header: None,
            query_param: None,
            path: "/api/v1/payments",
            bearer_token: Some(&token),
        };
        assert_eq!(resolve(&hints, Some("other")).unwrap().tenant_id, "default");
    }

    #[test]
    fn test_default_last() {
        let hints = TenantHints {
            header: None,
            query_param: None,
            path: "/api/v1/payments",
            bearer_token: None,
        };
        assert_eq!(resolve(&hints, None).unwrap().tenant_id, "default");
    }

    #[test]
    fn test_malformed_explicit_value_rejected() {
        let hints = TenantHints {
            header: Some("not a tenant!"),
            query_param: None,
            path: "/",
            bearer_token: None,
        };
        let err = resolve(&hints, None).unwrap_err();
        assert_eq!(err.kind(), "TenantInvalid");
        assert_eq!(err.http_status(), 400);
    }
}
