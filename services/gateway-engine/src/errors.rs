//! Boundary error rendering
//!
//! Failure bodies always carry the correlation id and, when known, the
//! UETR. Stack traces never cross the boundary.

use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use gateway_core::error::GatewayError;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub kind: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correlation_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uetr: Option<String>,
}

/// Render a gateway error with its flow identifiers
pub fn error_response(
    error: &GatewayError,
    correlation_id: Option<Uuid>,
    uetr: Option<&str>,
) -> HttpResponse {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    HttpResponse::build(status).json(ErrorBody {
        kind: error.kind(),
        message: error.to_string(),
        correlation_id,
        uetr: uetr.map(|u| u.to_string()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let response = error_response(
            &GatewayError::IdempotencyConflict { key: "K1".into() },
            None,
            None,
        );
        assert_eq!(response.status().as_u16(), 409);

        let response = error_response(
            &GatewayError::NoRouteAvailable {
                tenant_id: "acme".into(),
                payment_type: "RTGS".into(),
            },
            Some(Uuid::new_v4()),
            Some("20250115-PE01-P001-1A2B-0123456789AB"),
        );
        assert_eq!(response.status().as_u16(), 503);
    }
}
