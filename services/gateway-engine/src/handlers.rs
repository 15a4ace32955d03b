//! HTTP surface: ingress endpoints, scheme inbound, admin API

use crate::config::Config;
use crate::database::FlowRepository;
use crate::errors::error_response;
use crate::flow::{FlowRequest, MessageFlowEngine};
use crate::idempotency::{Admission, IdempotencyGate};
use crate::models::{FlowStatus, ResponseMode};
use crate::monitor::MonitorContext;
use crate::tenant_resolver::{self, TenantHints};
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use gateway_core::error::GatewayError;
use gateway_core::tenant::TenantContext;
use gateway_core::uetr::Uetr;
use prometheus::{Encoder, TextEncoder};
use resiliency::ResiliencyExecutor;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// Shared application state
pub struct AppState {
    pub config: Arc<Config>,
    pub engine: Arc<MessageFlowEngine>,
    pub executor: Arc<ResiliencyExecutor>,
    pub monitor: Arc<MonitorContext>,
    pub gate: IdempotencyGate,
    pub flows: FlowRepository,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowQuery {
    pub payment_type: Option<String>,
    pub local_instrument: Option<String>,
    pub response_mode: Option<ResponseMode>,
    pub tenant_id: Option<String>,
}

/// Route table
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(liveness))
        .route("/metrics", web::get().to(prometheus_metrics))
        .route("/health/services", web::get().to(service_health))
        .route(
            "/health/services/{service}",
            web::get().to(service_health_on_demand),
        )
        .route(
            "/admin/services/{service}/circuit/reset",
            web::post().to(reset_circuit),
        )
        .route("/uetr/{uetr}/journey", web::get().to(uetr_journey))
        .route(
            "/api/v1/payments/credit-transfer",
            web::post().to(credit_transfer),
        )
        .route("/api/v1/payments/reversal", web::post().to(reversal))
        .route("/api/v1/payments/cancellation", web::post().to(cancellation))
        .route(
            "/api/v1/payments/status-request",
            web::post().to(customer_status_request),
        )
        .route(
            "/api/v1/scheme/status-request",
            web::post().to(scheme_status_request),
        )
        .route("/api/v1/scheme/inbound", web::post().to(scheme_inbound));
}

async fn credit_transfer(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlowQuery>,
    body: web::Json<Value>,
) -> impl Responder {
    ingest(state, req, query, body, "pain.001.001.09").await
}

async fn reversal(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlowQuery>,
    body: web::Json<Value>,
) -> impl Responder {
    ingest(state, req, query, body, "pain.007.001.09").await
}

async fn cancellation(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlowQuery>,
    body: web::Json<Value>,
) -> impl Responder {
    ingest(state, req, query, body, "camt.055.001.08").await
}

async fn customer_status_request(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlowQuery>,
    body: web::Json<Value>,
) -> impl Responder {
    ingest(state, req, query, body, "camt.056.001.08").await
}

async fn scheme_status_request(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlowQuery>,
    body: web::Json<Value>,
) -> impl Responder {
    ingest(state, req, query, body, "pacs.028.001.03").await
}

/// Shared ingress pipeline: tenant resolution, idempotency gate, flow
/// engine, response shaping, idempotency persistence.
async fn ingest(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: web::Query<FlowQuery>,
    body: web::Json<Value>,
    message_type: &str,
) -> HttpResponse {
    let tenant = match resolve_tenant(&state, &req, &query) {
        Ok(tenant) => tenant,
        Err(error) => return error_response(&error, None, None),
    };

    let body = body.into_inner();
    let body_text = body.to_string();
    let endpoint = req.path().to_string();
    let method = req.method().as_str().to_string();

    let idempotency_key = header(&req, "X-Idempotency-Key");
    if let Some(key) = &idempotency_key {
        match state
            .gate
            .check(&tenant.tenant_id, key, &method, &endpoint, &body_text)
            .await
        {
            Ok(Admission::Proceed) => {}
            Ok(Admission::Replay(record)) => {
                return HttpResponse::build(
                    actix_web::http::StatusCode::from_u16(record.response_status as u16)
                        .unwrap_or(actix_web::http::StatusCode::OK),
                )
                .insert_header(("X-Idempotency-Replay", "true"))
                .insert_header(("X-Original-Request-Time", record.processed_at.to_rfc3339()))
                .json(record.response_body);
            }
            Err(error) => return error_response(&error, None, None),
        }
    }

    let request = FlowRequest {
        body,
        tenant_id: tenant.tenant_id.clone(),
        message_type: message_type.to_string(),
        payment_type: query
            .payment_type
            .clone()
            .unwrap_or_else(|| "RTGS".to_string()),
        local_instrument: query.local_instrument.clone(),
        response_mode: query.response_mode.unwrap_or_default(),
        queued_expires_at: None,
    };

    let result = match state.engine.process_client_to_scheme(request).await {
        Ok(result) => result,
        Err(error) => return error_response(&error, None, None),
    };

    if let Some(error) = &result.error {
        return error_response(error, Some(result.correlation_id), Some(&result.uetr));
    }

    let status = match result.status {
        FlowStatus::Success => actix_web::http::StatusCode::OK,
        _ => actix_web::http::StatusCode::ACCEPTED,
    };
    let response_body = json!({
        "correlationId": result.correlation_id,
        "uetr": result.uetr,
        "status": result.status.as_str(),
        "clearingSystemCode": result.clearing_system_code,
        "clientResponse": result.client_response,
        "processingTimeMs": result.processing_time_ms,
    });

    if let Some(key) = &idempotency_key {
        if let Err(e) = state
            .gate
            .store(
                &tenant.tenant_id,
                key,
                &method,
                &endpoint,
                &body_text,
                status.as_u16() as i32,
                &response_body,
            )
            .await
        {
            warn!("idempotency store failed: {}", e);
        }
    }

    HttpResponse::build(status).json(response_body)
}

async fn scheme_inbound(
    state: web::Data<AppState>,
    body: web::Json<Value>,
) -> impl Responder {
    match state.engine.process_scheme_to_client(body.into_inner()).await {
        Ok(result) => HttpResponse::Ok().json(json!({
            "correlationId": result.correlation_id,
            "uetr": result.uetr,
            "status": result.status.as_str(),
            "clientPayload": result.client_payload,
        })),
        // Orphans surface as 202 for operator review; everything else
        // maps through the error taxonomy
        Err(error) => error_response(&error, None, None),
    }
}

async fn liveness() -> impl Responder {
    HttpResponse::Ok().json(json!({
        "status": "healthy",
        "service": "gateway-engine",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

async fn service_health(state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.executor.all_health())
}

/// On-demand check of one service. Probes the downstream unless a
/// recent poll result is still fresh.
async fn service_health_on_demand(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let service = path.into_inner();
    match state.monitor.check_service(&service).await {
        Some(probe) => HttpResponse::Ok().json(json!({
            "probe": probe,
            "health": state.executor.health_snapshot(&service),
        })),
        None => error_response(
            &GatewayError::ValidationFailed {
                field_path: "service".to_string(),
                message: format!("no active adapter registers service {}", service),
            },
            None,
            None,
        ),
    }
}

async fn reset_circuit(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let service = path.into_inner();
    state.executor.force_reset(&service);
    HttpResponse::Ok().json(json!({ "service": service, "circuitState": "CLOSED" }))
}

async fn uetr_journey(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> impl Responder {
    let uetr = path.into_inner();
    if !Uetr::validate(&uetr) {
        return error_response(
            &GatewayError::ValidationFailed {
                field_path: "uetr".to_string(),
                message: "malformed UETR".to_string(),
            },
            None,
            None,
        );
    }
    match state.flows.journey(&uetr).await {
        Ok(entries) => HttpResponse::Ok().json(json!({ "uetr": uetr, "journey": entries })),
        Err(error) => error_response(&error, None, Some(&uetr)),
    }
}

async fn prometheus_metrics() -> impl Responder {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    let mut buffer = vec![];
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(_) => match String::from_utf8(buffer) {
            Ok(body) => HttpResponse::Ok()
                .content_type("text/plain; version=0.0.4")
                .body(body),
            Err(e) => HttpResponse::InternalServerError()
                .body(format!("failed to encode metrics: {}", e)),
        },
        Err(e) => {
            HttpResponse::InternalServerError().body(format!("failed to gather metrics: {}", e))
        }
    }
}

fn header(req: &HttpRequest, name: &str) -> Option<String> {
    req.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

fn resolve_tenant(
    state: &web::Data<AppState>,
    req: &HttpRequest,
    query: &FlowQuery,
) -> gateway_core::error::Result<TenantContext> {
    let header_value = header(req, "X-Tenant-ID");
    let bearer = header(req, "Authorization")
        .and_then(|v| v.strip_prefix("Bearer ").map(|t| t.to_string()));
    let hints = TenantHints {
        header: header_value.as_deref(),
        query_param: query.tenant_id.as_deref(),
        path: req.path(),
        bearer_token: bearer.as_deref(),
    };
    tenant_resolver::resolve(&hints, state.config.gateway.jwt_secret.as_deref())
}
