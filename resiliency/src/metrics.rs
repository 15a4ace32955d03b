//! Resiliency metrics

use prometheus::{
    register_counter_vec, register_histogram_vec, register_int_gauge_vec, CounterVec,
    HistogramVec, IntGaugeVec,
};

lazy_static::lazy_static! {
    pub static ref OUTBOUND_CALLS_TOTAL: CounterVec = register_counter_vec!(
        "gateway_outbound_calls_total",
        "Outbound scheme calls by service and outcome",
        &["service", "outcome"]
    )
    .unwrap();

    pub static ref OUTBOUND_CALL_DURATION: HistogramVec = register_histogram_vec!(
        "gateway_outbound_call_duration_seconds",
        "Outbound call duration",
        &["service"]
    )
    .unwrap();

    pub static ref CIRCUIT_BREAKER_STATE: IntGaugeVec = register_int_gauge_vec!(
        "gateway_circuit_breaker_state",
        "Circuit breaker state (0=closed, 1=half-open, 2=open)",
        &["service"]
    )
    .unwrap();

    pub static ref BULKHEAD_FREE_SLOTS: IntGaugeVec = register_int_gauge_vec!(
        "gateway_bulkhead_free_slots",
        "Free bulkhead slots per service",
        &["service"]
    )
    .unwrap();
}

/// Gauge encoding of a circuit state
pub fn circuit_state_value(state: crate::circuit_breaker::CircuitState) -> i64 {
    match state {
        crate::circuit_breaker::CircuitState::Closed => 0,
        crate::circuit_breaker::CircuitState::HalfOpen => 1,
        crate::circuit_breaker::CircuitState::Open => 2,
    }
}
