//! Instance pool management.
//!
//! # Responsibilities
//! - Hold the instances resolved for one dialed service
//! - Apply the load balancing algorithm to select an instance
//! - Provide in-flight guards for tracking

use std::sync::Arc;
use crate::mesh::instance::{Instance, InstanceGuard};
use crate::mesh::load_balancer::LoadBalancer;

/// Instances of one service plus the balancer that picks among them.
#[derive(Debug)]
pub struct InstancePool {
    service: String,
    instances: Vec<Arc<Instance>>,
    balancer: Box<dyn LoadBalancer>,
}

impl InstancePool {
    pub fn new(service: impl Into<String>, instances: Vec<Arc<Instance>>, balancer: Box<dyn LoadBalancer>) -> Self {
        Self {
            service: service.into(),
            instances,
            balancer,
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Select an instance for the next call.
    pub fn get(&self) -> Option<InstanceGuard> {
        let guard = self.balancer.next_instance(&self.instances);
        if guard.is_none() {
            tracing::debug!(
                service = %self.service,
                instance_count = self.instances.len(),
                "No available instance in pool"
            );
            for i in &self.instances {
                tracing::debug!(addr = %i.addr, state = i.circuit_state().as_str(), "Instance status");
            }
        }
        guard
    }

    /// All instances, regardless of breaker state.
    pub fn all_instances(&self) -> &[Arc<Instance>] {
        &self.instances
    }
}
