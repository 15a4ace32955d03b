//! # Gateway Core
//!
//! Shared domain plane for the payment-message gateway:
//! - Tenant context carried explicitly through every processing chain
//! - UETR identity plane (generation, validation, relatedness, extraction)
//! - The gateway error taxonomy

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unused_qualifications)]

pub mod error;
pub mod tenant;
pub mod uetr;

pub use error::{GatewayError, Result};
pub use tenant::TenantContext;
pub use uetr::Uetr;

/// Default system identifier embedded in minted UETRs (segment 2)
pub const DEFAULT_SYSTEM_ID: &str = "PE01";

/// Default idempotency record time-to-live (hours)
pub const DEFAULT_IDEMPOTENCY_TTL_HOURS: i64 = 24;

/// Default queued-message expiry (hours)
pub const DEFAULT_QUEUE_EXPIRY_HOURS: i64 = 72;
