//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the mesh target parses and names a registered service
//! - Validate value ranges (counts, thresholds, addresses)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ConsumerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use thiserror::Error;

use crate::config::schema::ConsumerConfig;
use crate::mesh::target::Target;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid socket address for {field}: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("invalid mesh target {target}: {reason}")]
    InvalidTarget { target: String, reason: String },

    #[error("{field} must be greater than zero")]
    NotPositive { field: &'static str },

    #[error("service {service} in namespace {namespace} has invalid instance address {address}")]
    InvalidInstance {
        namespace: String,
        service: String,
        address: String,
    },

    #[error("service {service} in namespace {namespace} is registered more than once")]
    DuplicateService { namespace: String, service: String },
}

pub fn validate_config(config: &ConsumerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }

    if config.echo.default_count == 0 {
        errors.push(ValidationError::NotPositive { field: "echo.default_count" });
    }

    if let Err(e) = Target::parse(&config.mesh.target) {
        errors.push(ValidationError::InvalidTarget {
            target: config.mesh.target.clone(),
            reason: e.to_string(),
        });
    }

    let mut seen: Vec<(&str, &str)> = Vec::new();
    for service in &config.mesh.services {
        let key = (service.namespace.as_str(), service.name.as_str());
        if seen.contains(&key) {
            errors.push(ValidationError::DuplicateService {
                namespace: service.namespace.clone(),
                service: service.name.clone(),
            });
        }
        seen.push(key);

        for address in &service.instances {
            if address.parse::<SocketAddr>().is_err() {
                errors.push(ValidationError::InvalidInstance {
                    namespace: service.namespace.clone(),
                    service: service.name.clone(),
                    address: address.clone(),
                });
            }
        }
    }

    let cb = &config.circuit_breaker;
    if cb.enabled {
        if cb.failure_threshold == 0 {
            errors.push(ValidationError::NotPositive { field: "circuit_breaker.failure_threshold" });
        }
        if cb.half_open_successes == 0 {
            errors.push(ValidationError::NotPositive { field: "circuit_breaker.half_open_successes" });
        }
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::NotPositive { field: "timeouts.connect_ms" });
    }
    if config.timeouts.call_ms == 0 {
        errors.push(ValidationError::NotPositive { field: "timeouts.call_ms" });
    }
    if config.timeouts.request_secs == Some(0) {
        errors.push(ValidationError::NotPositive { field: "timeouts.request_secs" });
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
