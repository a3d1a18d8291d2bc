//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → CLI overrides applied by the binary
//!     → validation.rs (semantic checks)
//!     → ConsumerConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::ConsumerConfig;
pub use schema::{
    CircuitBreakerConfig, EchoConfig, ListenerConfig, LoadBalancerPolicy, LogFormat, MeshConfig,
    ObservabilityConfig, ServiceConfig, TimeoutConfig,
};
