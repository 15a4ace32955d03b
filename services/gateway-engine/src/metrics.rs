//! Engine metrics

use prometheus::{register_counter_vec, register_int_gauge_vec, CounterVec, IntGaugeVec};

lazy_static::lazy_static! {
    pub static ref FLOWS_TOTAL: CounterVec = register_counter_vec!(
        "gateway_flows_total",
        "Message flows by tenant, message type and terminal status",
        &["tenant", "message_type", "status"]
    )
    .unwrap();

    pub static ref INBOUND_ORPHANS_TOTAL: CounterVec = register_counter_vec!(
        "gateway_inbound_orphans_total",
        "Inbound scheme messages with no correlation",
        &["message_type"]
    )
    .unwrap();

    pub static ref QUEUE_DEPTH: IntGaugeVec = register_int_gauge_vec!(
        "gateway_queue_depth",
        "Pending queued messages per service",
        &["service"]
    )
    .unwrap();

    pub static ref QUEUE_DRAINED_TOTAL: CounterVec = register_counter_vec!(
        "gateway_queue_drained_total",
        "Queued messages drained, by outcome",
        &["service", "outcome"]
    )
    .unwrap();

    pub static ref HEALTH_POLLS_TOTAL: CounterVec = register_counter_vec!(
        "gateway_health_polls_total",
        "Health-check probes by service and outcome",
        &["service", "outcome"]
    )
    .unwrap();
}

/// One flow observation
pub fn observe_flow(tenant: &str, message_type: &str, status: &str) {
    FLOWS_TOTAL
        .with_label_values(&[tenant, message_type, status])
        .inc();
}
