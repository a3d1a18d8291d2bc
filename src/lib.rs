//! Circuit-breaking echo consumer.
//!
//! An HTTP front end that forwards `count` sequential echo calls to a gRPC
//! service reached through a mesh-aware connection. Every call outcome is
//! classified and fed back into per-instance circuit breakers.

pub mod config;
pub mod consumer;
pub mod http;
pub mod lifecycle;
pub mod mesh;
pub mod observability;
pub mod pb;
pub mod provider;
pub mod resilience;

pub use config::schema::ConsumerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
