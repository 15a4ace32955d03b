//! # Clearing Adapters
//!
//! Per-tenant configured outbound targets for clearing schemes:
//! - `ClearingAdapter` aggregate with routes, message logs and domain events
//! - Scheme connector trait and HTTP client
//!
//! The aggregate owns its routes, logs and pending events exclusively.
//! Every mutation goes through a named intent and appends a typed domain
//! event; the caller drains events after each mutation.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod aggregate;
pub mod client;
pub mod events;
pub mod types;

pub use aggregate::{ClearingAdapter, ClearingRoute};
pub use client::{HttpSchemeClient, SchemeConnector, SchemeRequest, SchemeResponse};
pub use events::DomainEvent;
pub use types::*;

/// Default adapter request timeout (seconds)
pub const DEFAULT_ADAPTER_TIMEOUT_SECONDS: u64 = 30;

/// Default adapter retry attempts
pub const DEFAULT_ADAPTER_RETRY_ATTEMPTS: u32 = 3;
