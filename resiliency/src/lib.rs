//! # Resiliency
//!
//! Uniform protection for every outbound scheme call:
//! circuit breaker, retry, bulkhead, rate limiter, time limiter, fallback.
//!
//! ## Composition
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │                  Time Limiter                     │
//! │  ┌────────────────────────────────────────────┐  │
//! │  │               Rate Limiter                  │  │
//! │  │  ┌──────────────────────────────────────┐  │  │
//! │  │  │             Bulkhead                  │  │  │
//! │  │  │  ┌────────────────────────────────┐  │  │  │
//! │  │  │  │            Retry                │  │  │  │
//! │  │  │  │  ┌──────────────────────────┐  │  │  │  │
//! │  │  │  │  │     Circuit Breaker       │  │  │  │  │
//! │  │  │  │  │  ┌────────────────────┐  │  │  │  │  │
//! │  │  │  │  │  │    Target Call      │  │  │  │  │  │
//! │  │  │  │  │  └────────────────────┘  │  │  │  │  │
//! │  │  │  │  └──────────────────────────┘  │  │  │  │
//! │  │  │  └────────────────────────────────┘  │  │  │
//! │  │  └──────────────────────────────────────┘  │  │
//! │  └────────────────────────────────────────────┘  │
//! └──────────────────────────────────────────────────┘
//! ```
//!
//! The order is load-bearing: retries count against the breaker, the
//! bulkhead bounds in-flight work including retried attempts, the rate
//! limiter throttles admission to the bulkhead, the time limiter bounds
//! the whole.

#![forbid(unsafe_code)]
#![warn(rust_2018_idioms, unused_qualifications)]

pub mod bulkhead;
pub mod circuit_breaker;
pub mod executor;
pub mod health;
pub mod metrics;
pub mod policy;
pub mod rate_limiter;
pub mod retry;
pub mod time_limiter;

pub use circuit_breaker::{CircuitBreaker, CircuitBreakerRegistry, CircuitState};
pub use executor::{ResiliencyExecutor, TransportError};
pub use health::{HealthRegistry, HealthState, MetricsSnapshot, ServiceHealthStatus};
pub use policy::{PolicyRegistry, ResiliencyPolicy};
