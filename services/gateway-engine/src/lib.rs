//! # Gateway Engine
//!
//! The ISO 20022 payment-message gateway service: ingress handling,
//! idempotent admission, tenant resolution, flow orchestration, routing,
//! transformation, resilient dispatch, correlation, queued-message
//! replay and self-healing.

pub mod catalog;
pub mod config;
pub mod correlator;
pub mod database;
pub mod errors;
pub mod flow;
pub mod handlers;
pub mod idempotency;
pub mod metrics;
pub mod models;
pub mod monitor;
pub mod queue_store;
pub mod router;
pub mod tenant_resolver;
pub mod transform;
