//! Service discovery.
//!
//! # Responsibilities
//! - Resolve `(namespace, service)` to a set of instance addresses
//! - Keep the lookup behind a trait so other registries can be plugged in

use std::collections::HashMap;
use std::net::SocketAddr;
use thiserror::Error;

use crate::config::ServiceConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DiscoveryError {
    #[error("service {service} not found in namespace {namespace}")]
    ServiceNotFound { namespace: String, service: String },

    #[error("invalid instance address {0}")]
    InvalidAddress(String),
}

/// Source of service instances.
pub trait ServiceRegistry: Send + Sync {
    fn instances(&self, namespace: &str, service: &str) -> Result<Vec<SocketAddr>, DiscoveryError>;
}

/// Registry backed by a fixed table, usually built from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    services: HashMap<(String, String), Vec<SocketAddr>>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(services: &[ServiceConfig]) -> Result<Self, DiscoveryError> {
        let mut registry = Self::new();
        for service in services {
            let addrs = service
                .instances
                .iter()
                .map(|a| a.parse().map_err(|_| DiscoveryError::InvalidAddress(a.clone())))
                .collect::<Result<Vec<SocketAddr>, _>>()?;
            registry.register(&service.namespace, &service.name, addrs);
        }
        Ok(registry)
    }

    /// Add instances to a service, creating it if needed.
    pub fn register(&mut self, namespace: &str, service: &str, addrs: impl IntoIterator<Item = SocketAddr>) {
        let entry = self
            .services
            .entry((namespace.to_string(), service.to_string()))
            .or_default();
        for addr in addrs {
            if !entry.contains(&addr) {
                entry.push(addr);
            }
        }
    }
}

impl ServiceRegistry for StaticRegistry {
    fn instances(&self, namespace: &str, service: &str) -> Result<Vec<SocketAddr>, DiscoveryError> {
        self.services
            .get(&(namespace.to_string(), service.to_string()))
            .cloned()
            .ok_or_else(|| DiscoveryError::ServiceNotFound {
                namespace: namespace.to_string(),
                service: service.to_string(),
            })
    }
}
