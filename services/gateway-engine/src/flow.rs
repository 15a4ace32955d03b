//! Message flow engine
//!
//! Orchestrates the client-to-scheme pipeline: UETR establishment, flow
//! record, structural validation, routing, transformation, resilient
//! dispatch and response shaping; and the scheme-to-client path:
//! correlation, flow completion and client delivery.

use crate::catalog::AdapterCatalog;
use crate::config::Config;
use crate::correlator::{CorrelationEntry, Correlator};
use crate::database::{FlowRepository, MessageLogRepository};
use crate::metrics;
use crate::models::{
    FlowDirection, FlowRecord, FlowStatus, MessageFlowResult, ResponseMode, RoutingType,
};
use crate::queue_store::QueueStore;
use crate::router::{RouteDecision, Router};
use crate::transform;
use adapters::{MessageDirection, SchemeConnector, SchemeRequest, WireFormat};
use chrono::{DateTime, Duration, Utc};
use gateway_core::error::{GatewayError, Result};
use gateway_core::tenant::TenantContext;
use gateway_core::uetr::{Uetr, UetrGenerator};
use iso20022::{locate_original_refs, locate_uetr, MessageType, StructuralValidator};
use resiliency::ResiliencyExecutor;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Service name used for the internal same-bank leg
pub const INTERNAL_SERVICE: &str = "internal-ledger";

/// One unit of client-to-scheme work. Serializable so queued messages
/// can be replayed through the engine unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlowRequest {
    pub body: Value,
    pub tenant_id: String,
    pub message_type: String,
    pub payment_type: String,
    pub local_instrument: Option<String>,
    pub response_mode: ResponseMode,
    /// Set once the request has been queued; re-queues keep the
    /// original deadline instead of minting a fresh one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_expires_at: Option<DateTime<Utc>>,
}

/// A transformed message ready for dispatch
struct Transformed {
    value: Value,
    message_type: MessageType,
    transaction_id: Option<String>,
    payload: String,
}

/// Everything the background completion of an ASYNC dispatch needs
struct AsyncDispatch {
    service_name: String,
    scheme_request: SchemeRequest,
    decision: RouteDecision,
    correlation_id: Uuid,
    uetr: Uetr,
    tenant_id: String,
    message_type: MessageType,
    transformed_type: MessageType,
    replay: FlowRequest,
}

/// Outcome of one inbound scheme message
#[derive(Debug, Clone, Serialize)]
pub struct InboundResult {
    pub correlation_id: Option<Uuid>,
    pub uetr: Option<String>,
    pub status: FlowStatus,
    pub client_payload: Value,
}

pub struct MessageFlowEngine {
    config: Arc<Config>,
    uetr_gen: UetrGenerator,
    validator: StructuralValidator,
    router: Router,
    executor: Arc<ResiliencyExecutor>,
    correlator: Arc<Correlator>,
    flows: FlowRepository,
    message_logs: MessageLogRepository,
    queue: QueueStore,
    connector: Arc<dyn SchemeConnector>,
}

impl MessageFlowEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: Arc<Config>,
        catalog: Arc<AdapterCatalog>,
        executor: Arc<ResiliencyExecutor>,
        correlator: Arc<Correlator>,
        flows: FlowRepository,
        message_logs: MessageLogRepository,
        queue: QueueStore,
        connector: Arc<dyn SchemeConnector>,
    ) -> Result<Self> {
        Ok(Self {
            uetr_gen: UetrGenerator::new(&config.gateway.system_id)?,
            validator: StructuralValidator::new(config.gateway.strict_validation),
            router: Router::new(catalog),
            config,
            executor,
            correlator,
            flows,
            message_logs,
            queue,
            connector,
        })
    }

    /// The client-to-scheme pipeline
    pub async fn process_client_to_scheme(
        self: &Arc<Self>,
        request: FlowRequest,
    ) -> Result<MessageFlowResult> {
        let started = Instant::now();
        let tenant = TenantContext::new(&request.tenant_id)?;
        let message_type = MessageType::parse(&request.message_type)?;

        // Step 1: extract or mint the UETR
        let uetr = match locate_uetr(&request.body, message_type) {
            Some(found) => Uetr::parse(&found)?,
            None => self.uetr_gen.generate(message_type.as_str()),
        };

        // Step 2: open the flow record
        let mut record = FlowRecord::open(
            uetr.as_str(),
            &tenant.tenant_id,
            FlowDirection::ClientToScheme,
            message_type.as_str(),
        );
        self.flows.save(&record).await?;
        self.journey(&record, "INITIATED", None).await;
        info!(
            correlation_id = %record.correlation_id,
            uetr = %uetr,
            tenant = %tenant,
            message_type = %message_type,
            "flow opened"
        );

        let client_message_id = client_message_id(&request.body, message_type);

        // Step 3: structural validation
        let validation = self.validator.validate(message_type, &request.body);
        if validation.has_errors() {
            let first = &validation.errors[0];
            let error = GatewayError::ValidationFailed {
                field_path: first.field_path.clone(),
                message: first.message.clone(),
            };
            return self
                .fail(record, started, error, Some(&validation))
                .await;
        }
        let mut metadata = json!({ "clientMessageId": client_message_id });
        if !validation.warnings.is_empty() {
            metadata["schemaWarnings"] = serde_json::to_value(&validation.warnings)
                .unwrap_or(Value::Null);
        }
        record.metadata = metadata;

        // Step 4: route
        let decision = match self.route(&tenant, &request, message_type) {
            Ok(decision) => decision,
            Err(error) => return self.fail(record, started, error, None).await,
        };
        record.clearing_system_code = decision.routing.clearing_system_code.clone();

        // Step 5: transform, threading the UETR unchanged
        let transformed = match self.transform(
            &request.body,
            message_type,
            &tenant,
            &uetr,
            decision.routing.message_format,
        ) {
            Ok(out) => out,
            Err(error) => return self.fail(record, started, error, None).await,
        };
        let Transformed {
            value: transformed_value,
            message_type: transformed_type,
            transaction_id,
            payload,
        } = transformed;
        record.transformed_message_type = Some(transformed_type.to_string());
        record.transaction_id = transaction_id.clone();
        record.status = FlowStatus::Transformed;
        self.flows.save(&record).await?;
        self.journey(&record, "TRANSFORMED", Some(transformed_type.as_str()))
            .await;

        // Step 6: dispatch through the resiliency executor
        let (service_name, endpoint) = match (&decision.routing.routing_type, &decision.matched) {
            (RoutingType::SameBank, _) => (
                INTERNAL_SERVICE.to_string(),
                self.config.gateway.internal_endpoint.clone(),
            ),
            (RoutingType::OtherBank, Some(matched)) => (
                matched.adapter.service_name(),
                matched.adapter.endpoint.clone(),
            ),
            (RoutingType::OtherBank, None) => {
                let error = GatewayError::NoRouteAvailable {
                    tenant_id: tenant.tenant_id.clone(),
                    payment_type: request.payment_type.clone(),
                };
                return self.fail(record, started, error, None).await;
            }
        };

        record.status = FlowStatus::Dispatched;
        self.flows.save(&record).await?;
        self.journey(&record, "DISPATCHED", Some(&service_name)).await;

        let scheme_request = SchemeRequest {
            endpoint,
            payload,
            format: decision.routing.message_format,
            correlation_id: record.correlation_id.to_string(),
            uetr: Some(uetr.to_string()),
        };

        record.status = FlowStatus::AwaitingResponse;
        self.flows.save(&record).await?;

        // Step 7 splits on the requested response mode. ASYNC answers
        // with an accepted-pending PAIN.002 without waiting on the
        // adapter round trip: the dispatch runs in the background and
        // the flow completes through the inbound path once the scheme
        // status is in hand.
        if request.response_mode == ResponseMode::Async {
            // Registered before the dispatch so the status can never
            // race the acknowledgement
            self.correlator.register(CorrelationEntry {
                correlation_id: record.correlation_id,
                uetr: uetr.to_string(),
                tenant_id: tenant.tenant_id.clone(),
                client_message_id: client_message_id.clone(),
                original_message_id: scheme_message_id(&transformed_value),
                original_transaction_id: transaction_id,
                registered_at: Utc::now(),
            });
            self.journey(&record, "AWAITING_RESPONSE", None).await;

            let engine = Arc::clone(self);
            let background = AsyncDispatch {
                service_name: service_name.clone(),
                scheme_request,
                decision: decision.clone(),
                correlation_id: record.correlation_id,
                uetr: uetr.clone(),
                tenant_id: tenant.tenant_id.clone(),
                message_type,
                transformed_type,
                replay: request.clone(),
            };
            tokio::spawn(async move { engine.finish_async_dispatch(background).await });

            let ack = transform::status_pain002(
                &client_message_id,
                message_type.as_str(),
                Some(&uetr),
                "PDNG",
                None,
                &self.uetr_gen,
            );
            metrics::observe_flow(&tenant.tenant_id, message_type.as_str(), "AWAITING_RESPONSE");
            let ack = iso20022::to_json(&ack)?;
            return Ok(self.result(&record, &uetr, Some(transformed_value), Some(ack), None, started));
        }

        // IMMEDIATE: wait for the adapter reply, bounded by the
        // policy's time limiter
        let connector = self.connector.clone();
        let dispatch = self
            .executor
            .execute(&service_name, || {
                let connector = connector.clone();
                let scheme_request = scheme_request.clone();
                async move { connector.send(&scheme_request).await }
            })
            .await;

        // Step 8: shape the client response and terminalize
        match dispatch {
            Ok(response) => {
                self.log_exchange(
                    &decision,
                    record.correlation_id,
                    transformed_type,
                    &scheme_request,
                    &response.body,
                )
                .await;
                let shaped =
                    self.shape_immediate(&response.body, &client_message_id, &uetr, &decision);
                record.complete(FlowStatus::Success);
                self.flows.save(&record).await?;
                self.journey(&record, "SUCCESS", None).await;
                metrics::observe_flow(&tenant.tenant_id, message_type.as_str(), "SUCCESS");
                Ok(self.result(&record, &uetr, Some(transformed_value), Some(shaped), None, started))
            }
            Err(error) if error.kind() == "AdapterUnavailable" => {
                // Circuit open or bulkhead exhausted: defer to the queue
                let expires_at = request.queued_expires_at.unwrap_or_else(|| {
                    Utc::now()
                        + Duration::hours(self.config.queue_expiry_hours_for(&tenant.tenant_id))
                });
                let mut replay_request = request.clone();
                replay_request.queued_expires_at = Some(expires_at);
                let replay = serde_json::to_value(&replay_request)
                    .map_err(|e| GatewayError::Internal(e.to_string()))?;
                self.queue
                    .enqueue(
                        &tenant.tenant_id,
                        &service_name,
                        &replay,
                        expires_at,
                        &error.to_string(),
                    )
                    .await?;
                warn!(
                    correlation_id = %record.correlation_id,
                    service = %service_name,
                    "adapter unavailable, flow queued"
                );
                record.complete(FlowStatus::Queued);
                self.flows.save(&record).await?;
                self.journey(&record, "QUEUED", Some(&service_name)).await;
                metrics::observe_flow(&tenant.tenant_id, message_type.as_str(), "QUEUED");
                Ok(self.result(&record, &uetr, Some(transformed_value), None, Some(error), started))
            }
            Err(error) => {
                let status = if error.kind() == "Timeout" {
                    FlowStatus::TimedOut
                } else {
                    FlowStatus::Failed
                };
                record.complete(status);
                self.flows.save(&record).await?;
                self.journey(&record, status.as_str(), Some(error.kind())).await;
                metrics::observe_flow(&tenant.tenant_id, message_type.as_str(), status.as_str());
                Ok(self.result(&record, &uetr, Some(transformed_value), None, Some(error), started))
            }
        }
    }

    /// The scheme-to-client path: correlate, complete, deliver
    pub async fn process_scheme_to_client(&self, body: Value) -> Result<InboundResult> {
        let message_type = detect_message_type(&body).ok_or_else(|| {
            GatewayError::ValidationFailed {
                field_path: "Document".to_string(),
                message: "unrecognized inbound message root".to_string(),
            }
        })?;

        // Incoming credits open a fresh scheme-to-client flow; everything
        // else must correlate to an in-flight one.
        if message_type == MessageType::Pacs008 {
            return self.accept_incoming_credit(body).await;
        }

        let uetr = locate_uetr(&body, message_type);
        let refs = locate_original_refs(&body, message_type);

        let entry = match self.correlator.resolve(uetr.as_deref(), &refs) {
            Some(entry) => entry,
            None => {
                warn!(
                    uetr = ?uetr,
                    original_message_id = ?refs.original_message_id,
                    "orphan inbound message"
                );
                metrics::INBOUND_ORPHANS_TOTAL
                    .with_label_values(&[message_type.as_str()])
                    .inc();
                return Err(GatewayError::OrphanResponse {
                    uetr,
                    original_message_id: refs.original_message_id,
                });
            }
        };

        let original_uetr = Uetr::parse(&entry.uetr)?;
        let client_message_id = entry.client_message_id.clone();

        let (status, client_payload) = match message_type {
            MessageType::Pacs002 => {
                let doc: iso20022::pacs002::Pacs002Document = iso20022::from_json(&body)?;
                let accepted = doc.is_accepted();
                let shaped = transform::pacs002_to_pain002(
                    &doc,
                    &client_message_id,
                    Some(&original_uetr),
                    &self.uetr_gen,
                );
                let status = if accepted {
                    FlowStatus::Success
                } else {
                    FlowStatus::Failed
                };
                (status, iso20022::to_json(&shaped)?)
            }
            MessageType::Pacs004 => {
                let doc: iso20022::pacs004::Pacs004Document = iso20022::from_json(&body)?;
                let shaped = transform::pacs004_to_pain002(
                    &doc,
                    &client_message_id,
                    Some(&original_uetr),
                    &self.uetr_gen,
                );
                (FlowStatus::Failed, iso20022::to_json(&shaped)?)
            }
            MessageType::Camt029 => {
                let doc: iso20022::camt029::Camt029Document = iso20022::from_json(&body)?;
                let status = if doc.is_cancelled() {
                    FlowStatus::Success
                } else {
                    FlowStatus::Failed
                };
                let notification = transform::camt029_to_notification(&doc);
                (status, serde_json::to_value(notification)
                    .map_err(|e| GatewayError::Internal(e.to_string()))?)
            }
            MessageType::Camt054 => {
                let doc: iso20022::camt054::Camt054Document = iso20022::from_json(&body)?;
                let notification = transform::camt054_to_notification(&doc);
                (FlowStatus::Success, serde_json::to_value(notification)
                    .map_err(|e| GatewayError::Internal(e.to_string()))?)
            }
            other => {
                return Err(GatewayError::ValidationFailed {
                    field_path: "Document".to_string(),
                    message: format!("unsupported inbound message type: {}", other),
                })
            }
        };

        self.flows
            .complete_by_correlation(entry.correlation_id, status)
            .await?;
        self.flows
            .record_journey(
                &entry.uetr,
                entry.correlation_id,
                status.as_str(),
                Some(message_type.as_str()),
            )
            .await
            .unwrap_or_else(|e| error!("journey append failed: {}", e));
        self.correlator.evict(&entry.uetr);
        metrics::observe_flow(&entry.tenant_id, message_type.as_str(), status.as_str());
        info!(
            correlation_id = %entry.correlation_id,
            uetr = %entry.uetr,
            status = status.as_str(),
            "inbound message correlated"
        );

        Ok(InboundResult {
            correlation_id: Some(entry.correlation_id),
            uetr: Some(entry.uetr),
            status,
            client_payload,
        })
    }

    /// An unsolicited inbound pacs.008: a credit arriving for one of our
    /// clients. Opens its own scheme-to-client flow.
    async fn accept_incoming_credit(&self, body: Value) -> Result<InboundResult> {
        let uetr = match locate_uetr(&body, MessageType::Pacs008) {
            Some(found) => Uetr::parse(&found)?,
            None => self.uetr_gen.generate(MessageType::Pacs008.as_str()),
        };
        let mut record = FlowRecord::open(
            uetr.as_str(),
            gateway_core::tenant::DEFAULT_TENANT,
            FlowDirection::SchemeToClient,
            MessageType::Pacs008.as_str(),
        );
        record.complete(FlowStatus::Success);
        self.flows.save(&record).await?;
        self.journey(&record, "INBOUND_CREDIT", None).await;

        let doc: iso20022::pacs008::Pacs008Document = iso20022::from_json(&body)?;
        let amount = doc
            .first_transaction()
            .map(|tx| tx.interbank_settlement_amount.clone());

        Ok(InboundResult {
            correlation_id: Some(record.correlation_id),
            uetr: Some(uetr.to_string()),
            status: FlowStatus::Success,
            client_payload: json!({
                "notificationType": "INCOMING_CREDIT",
                "uetr": uetr.to_string(),
                "amount": amount.as_ref().map(|a| a.amount.clone()),
                "currency": amount.as_ref().map(|a| a.currency.clone()),
            }),
        })
    }

    fn route(
        &self,
        tenant: &TenantContext,
        request: &FlowRequest,
        message_type: MessageType,
    ) -> Result<RouteDecision> {
        match message_type {
            MessageType::Pain001 => {
                let (from, to) = pain001_accounts(&request.body);
                self.router.route(
                    tenant,
                    from.as_deref(),
                    to.as_deref(),
                    &request.payment_type,
                    request.local_instrument.as_deref(),
                )
            }
            _ => self.router.route_followup(
                tenant,
                &request.payment_type,
                request.local_instrument.as_deref(),
            ),
        }
    }

    /// Transform into the scheme dialect. Returns the transformed tree,
    /// its type, the carried transaction id and the wire payload.
    fn transform(
        &self,
        body: &Value,
        message_type: MessageType,
        tenant: &TenantContext,
        uetr: &Uetr,
        format: WireFormat,
    ) -> Result<Transformed> {
        fn pack<T: serde::Serialize>(
            doc: &T,
            message_type: MessageType,
            transaction_id: Option<String>,
            format: WireFormat,
        ) -> Result<Transformed> {
            let value = iso20022::to_json(doc)?;
            let payload = match format {
                WireFormat::Xml => iso20022::to_xml(doc)?,
                WireFormat::Json => value.to_string(),
            };
            Ok(Transformed {
                value,
                message_type,
                transaction_id,
                payload,
            })
        }

        match message_type {
            MessageType::Pain001 => {
                let doc: iso20022::pain001::Pain001Document = iso20022::from_json(body)?;
                let transformed =
                    transform::pain001_to_pacs008(&doc, tenant, uetr.as_str(), None)?;
                let tx_id = transformed
                    .first_transaction()
                    .and_then(|tx| tx.payment_identification.transaction_id.clone());
                pack(&transformed, MessageType::Pacs008, tx_id, format)
            }
            MessageType::Pain007 => {
                let doc: iso20022::pain007::Pain007Document = iso20022::from_json(body)?;
                let transformed = transform::pain007_to_pacs007(&doc, tenant)?;
                pack(&transformed, MessageType::Pacs007, None, format)
            }
            MessageType::Camt055 => {
                let doc: iso20022::camt055::Camt055Document = iso20022::from_json(body)?;
                let tx_id = doc
                    .first_cancellation()
                    .and_then(|tx| tx.original_transaction_id.clone());
                let transformed = transform::camt055_to_pacs007(&doc, tenant)?;
                pack(&transformed, MessageType::Pacs007, tx_id, format)
            }
            MessageType::Camt056 => {
                let doc: iso20022::camt056::Camt056Document = iso20022::from_json(body)?;
                let transformed = transform::camt056_to_pacs028(&doc, tenant)?;
                pack(&transformed, MessageType::Pacs028, None, format)
            }
            MessageType::Pacs028 => {
                // Already in the scheme dialect; forwarded as-is
                let doc: iso20022::pacs028::Pacs028Document = iso20022::from_json(body)?;
                let tx_id = doc
                    .first_request()
                    .and_then(|tx| tx.original_transaction_id.clone());
                pack(&doc, MessageType::Pacs028, tx_id, format)
            }
            other => Err(GatewayError::ValidationFailed {
                field_path: "messageType".to_string(),
                message: format!("{} cannot enter the client-to-scheme pipeline", other),
            }),
        }
    }

    fn shape_immediate(
        &self,
        response_body: &str,
        client_message_id: &str,
        uetr: &Uetr,
        decision: &RouteDecision,
    ) -> Value {
        // Scheme answers arrive as pacs.002 (XML on the scheme path,
        // JSON internally); anything unparseable still acknowledges.
        let parsed: Option<iso20022::pacs002::Pacs002Document> =
            match decision.routing.message_format {
                WireFormat::Xml => iso20022::from_xml(response_body).ok(),
                WireFormat::Json => serde_json::from_str(response_body).ok(),
            };
        let shaped = match parsed {
            Some(doc) => transform::pacs002_to_pain002(
                &doc,
                client_message_id,
                Some(uetr),
                &self.uetr_gen,
            ),
            None => transform::status_pain002(
                client_message_id,
                "pain.001.001.09",
                Some(uetr),
                "ACCP",
                None,
                &self.uetr_gen,
            ),
        };
        iso20022::to_json(&shaped).unwrap_or(Value::Null)
    }

    async fn fail(
        &self,
        mut record: FlowRecord,
        started: Instant,
        error: GatewayError,
        validation: Option<&iso20022::ValidationResult>,
    ) -> Result<MessageFlowResult> {
        if let Some(validation) = validation {
            record.metadata = serde_json::to_value(validation).unwrap_or(Value::Null);
        }
        record.complete(FlowStatus::Failed);
        self.flows.save(&record).await?;
        self.journey(&record, "FAILED", Some(error.kind())).await;
        metrics::observe_flow(&record.tenant_id, &record.original_message_type, "FAILED");
        let uetr = Uetr::parse(&record.uetr)?;
        Ok(self.result(&record, &uetr, None, None, Some(error), started))
    }

    #[allow(clippy::too_many_arguments)]
    fn result(
        &self,
        record: &FlowRecord,
        uetr: &Uetr,
        transformed_message: Option<Value>,
        client_response: Option<Value>,
        error: Option<GatewayError>,
        started: Instant,
    ) -> MessageFlowResult {
        MessageFlowResult {
            message_id: record
                .metadata
                .get("clientMessageId")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            correlation_id: record.correlation_id,
            uetr: uetr.to_string(),
            status: record.status,
            clearing_system_code: record.clearing_system_code.clone(),
            transaction_id: record.transaction_id.clone(),
            transformed_message,
            clearing_system_response: None,
            client_response,
            processing_time_ms: started.elapsed().as_millis() as i64,
            metadata: record.metadata.clone(),
            error,
        }
    }

    /// Complete an ASYNC dispatch off the request path. With the HTTP
    /// adapter contract the reply body already carries the scheme's
    /// status report, so it is fed straight through the inbound path;
    /// a bare technical acknowledgement leaves the flow awaiting the
    /// scheme callback instead.
    async fn finish_async_dispatch(self: Arc<Self>, ctx: AsyncDispatch) {
        let connector = self.connector.clone();
        let scheme_request = ctx.scheme_request.clone();
        let dispatch = self
            .executor
            .execute(&ctx.service_name, || {
                let connector = connector.clone();
                let scheme_request = scheme_request.clone();
                async move { connector.send(&scheme_request).await }
            })
            .await;

        match dispatch {
            Ok(response) => {
                self.log_exchange(
                    &ctx.decision,
                    ctx.correlation_id,
                    ctx.transformed_type,
                    &ctx.scheme_request,
                    &response.body,
                )
                .await;

                let parsed: Option<Value> = match ctx.decision.routing.message_format {
                    WireFormat::Xml => {
                        iso20022::from_xml::<iso20022::pacs002::Pacs002Document>(&response.body)
                            .ok()
                            .and_then(|doc| iso20022::to_json(&doc).ok())
                    }
                    WireFormat::Json => serde_json::from_str::<Value>(&response.body)
                        .ok()
                        .filter(|value| detect_message_type(value).is_some()),
                };
                match parsed {
                    Some(value) => {
                        if let Err(e) = self.process_scheme_to_client(value).await {
                            warn!(
                                correlation_id = %ctx.correlation_id,
                                "async dispatch reply could not complete the flow: {}", e
                            );
                        }
                    }
                    None => info!(
                        correlation_id = %ctx.correlation_id,
                        service = %ctx.service_name,
                        "scheme acknowledged, awaiting asynchronous status callback"
                    ),
                }
            }
            Err(error) if error.kind() == "AdapterUnavailable" => {
                let expires_at = ctx.replay.queued_expires_at.unwrap_or_else(|| {
                    Utc::now()
                        + Duration::hours(self.config.queue_expiry_hours_for(&ctx.tenant_id))
                });
                let mut replay_request = ctx.replay.clone();
                replay_request.queued_expires_at = Some(expires_at);
                match serde_json::to_value(&replay_request) {
                    Ok(replay) => {
                        if let Err(e) = self
                            .queue
                            .enqueue(
                                &ctx.tenant_id,
                                &ctx.service_name,
                                &replay,
                                expires_at,
                                &error.to_string(),
                            )
                            .await
                        {
                            error!("queue fallback failed: {}", e);
                        }
                    }
                    Err(e) => error!("replay payload serialization failed: {}", e),
                }
                warn!(
                    correlation_id = %ctx.correlation_id,
                    service = %ctx.service_name,
                    "adapter unavailable, async flow queued"
                );
                self.terminalize_async(&ctx, FlowStatus::Queued, &error).await;
            }
            Err(error) => {
                let status = if error.kind() == "Timeout" {
                    FlowStatus::TimedOut
                } else {
                    FlowStatus::Failed
                };
                self.terminalize_async(&ctx, status, &error).await;
            }
        }
    }

    /// Terminalize a background dispatch, releasing its correlation
    async fn terminalize_async(&self, ctx: &AsyncDispatch, status: FlowStatus, error: &GatewayError) {
        if let Err(e) = self
            .flows
            .complete_by_correlation(ctx.correlation_id, status)
            .await
        {
            error!("flow completion failed: {}", e);
        }
        if let Err(e) = self
            .flows
            .record_journey(
                ctx.uetr.as_str(),
                ctx.correlation_id,
                status.as_str(),
                Some(error.kind()),
            )
            .await
        {
            error!("journey append failed: {}", e);
        }
        self.correlator.evict(ctx.uetr.as_str());
        metrics::observe_flow(&ctx.tenant_id, ctx.message_type.as_str(), status.as_str());
    }

    /// Record the outbound/inbound exchange on the adapter aggregate
    /// and persist its append-only message log.
    async fn log_exchange(
        &self,
        decision: &RouteDecision,
        correlation_id: Uuid,
        transformed_type: MessageType,
        scheme_request: &SchemeRequest,
        response_body: &str,
    ) {
        let Some(matched) = &decision.matched else {
            return;
        };
        let correlation = correlation_id.to_string();
        let mut adapter = matched.adapter.clone();
        adapter.log_message(
            MessageDirection::Outbound,
            transformed_type.as_str(),
            &correlation,
            &scheme_request.payload,
        );
        adapter.log_message(
            MessageDirection::Inbound,
            "scheme-response",
            &correlation,
            response_body,
        );
        for event in adapter.take_events() {
            info!(
                adapter_id = %event.adapter_id(),
                event = event.event_type(),
                correlation_id = %correlation,
                "adapter event"
            );
        }
        for log in adapter.message_logs() {
            if let Err(e) = self.message_logs.append(log).await {
                error!("message log persistence failed: {}", e);
            }
        }
    }

    async fn journey(&self, record: &FlowRecord, status: &str, detail: Option<&str>) {
        if let Err(e) = self
            .flows
            .record_journey(&record.uetr, record.correlation_id, status, detail)
            .await
        {
            error!("journey append failed: {}", e);
        }
    }

    /// Shared UETR generator (response shapers in handlers)
    pub fn uetr_generator(&self) -> &UetrGenerator {
        &self.uetr_gen
    }

    /// Shared correlator
    pub fn correlator(&self) -> Arc<Correlator> {
        self.correlator.clone()
    }
}

/// Client message identifier for echoing in status reports
fn client_message_id(body: &Value, message_type: MessageType) -> String {
    let root = match message_type {
        MessageType::Pain001 => "CstmrCdtTrfInitn",
        MessageType::Pain007 => "CstmrPmtRvsl",
        MessageType::Camt055 => "CstmrPmtCxlReq",
        MessageType::Camt056 => "FIToFIPmtCxlReq",
        MessageType::Pacs028 => "FIToFIPmtStsReq",
        _ => "",
    };
    body.get(root)
        .and_then(|r| {
            r.pointer("/GrpHdr/MsgId")
                .or_else(|| r.pointer("/Assgnmt/Id"))
        })
        .and_then(Value::as_str)
        .unwrap_or("UNKNOWN")
        .to_string()
}

/// MsgId of a transformed scheme message (correlator secondary index)
fn scheme_message_id(transformed: &Value) -> Option<String> {
    transformed
        .as_object()?
        .values()
        .next()?
        .pointer("/GrpHdr/MsgId")?
        .as_str()
        .map(|s| s.to_string())
}

/// Debtor and creditor account numbers of a pain.001 body
fn pain001_accounts(body: &Value) -> (Option<String>, Option<String>) {
    let root = &body["CstmrCdtTrfInitn"]["PmtInf"][0];
    let from = account_number(&root["DbtrAcct"]);
    let to = account_number(&root["CdtTrfTxInf"][0]["CdtrAcct"]);
    (from, to)
}

fn account_number(account: &Value) -> Option<String> {
    account
        .pointer("/Id/IBAN")
        .or_else(|| account.pointer("/Id/Othr/Id"))
        .and_then(Value::as_str)
        .map(|s| s.to_string())
}

/// Recognize an inbound scheme message by its root element
pub fn detect_message_type(body: &Value) -> Option<MessageType> {
    let object = body.as_object()?;
    for (key, message_type) in [
        ("FIToFIPmtStsRpt", MessageType::Pacs002),
        ("PmtRtr", MessageType::Pacs004),
        ("FIToFICstmrCdtTrf", MessageType::Pacs008),
        ("RsltnOfInvstgtn", MessageType::Camt029),
        ("BkToCstmrDbtCdtNtfctn", MessageType::Camt054),
    ] {
        if object.contains_key(key) {
            return Some(message_type);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_detect_message_type() {
        assert_eq!(
            detect_message_type(&json!({ "FIToFIPmtStsRpt": {} })),
            Some(MessageType::Pacs002)
        );
        assert_eq!(
            detect_message_type(&json!({ "BkToCstmrDbtCdtNtfctn": {} })),
            Some(MessageType::Camt054)
        );
        assert_eq!(detect_message_type(&json!({ "Unknown": {} })), None);
        assert_eq!(detect_message_type(&json!(null)), None);
    }

    #[test]
    fn test_pain001_account_extraction() {
        let body = json!({
            "CstmrCdtTrfInitn": {
                "PmtInf": [{
                    "DbtrAcct": { "Id": { "IBAN": "GB29NWBK60161331926819" } },
                    "CdtTrfTxInf": [{
                        "CdtrAcct": { "Id": { "Othr": { "Id": "632005123456" } } }
                    }]
                }]
            }
        });
        let (from, to) = pain001_accounts(&body);
        assert_eq!(from.as_deref(), Some("GB29NWBK60161331926819"));
        assert_eq!(to.as_deref(), Some("632005123456"));
    }

    #[test]
    fn test_client_message_id_paths() {
        let pain001 = json!({ "CstmrCdtTrfInitn": { "GrpHdr": { "MsgId": "M-1" } } });
        assert_eq!(client_message_id(&pain001, MessageType::Pain001), "M-1");

        let camt055 = json!({ "CstmrPmtCxlReq": { "Assgnmt": { "Id": "CASE-9" } } });
        assert_eq!(client_message_id(&camt055, MessageType::Camt055), "CASE-9");

        assert_eq!(client_message_id(&json!({}), MessageType::Pain001), "UNKNOWN");
    }

    #[test]
    fn test_scheme_message_id() {
        let transformed = json!({
            "FIToFICstmrCdtTrf": { "GrpHdr": { "MsgId": "P8-ABC" } }
        });
        assert_eq!(scheme_message_id(&transformed).as_deref(), Some("P8-ABC"));
        assert_eq!(scheme_message_id(&json!({})), None);
    }
}
