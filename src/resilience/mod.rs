//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Call to a service instance:
//!     → circuit_breaker.rs (admit or refuse before the call)
//!     → gRPC call on the instance channel
//!     → report analyzer classifies the outcome
//!     → circuit_breaker.rs (record success/failure, open circuit if threshold exceeded)
//! ```
//!
//! # Design Decisions
//! - Breaker state is per instance, never per service
//! - Refused calls never touch the network
//! - Timeouts are enforced by the gRPC channel, not here

pub mod circuit_breaker;

pub use circuit_breaker::{Admission, CircuitBreaker, CircuitState};
