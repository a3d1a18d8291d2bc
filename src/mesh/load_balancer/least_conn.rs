//! Least Connections load balancing strategy.

use std::sync::Arc;
use crate::mesh::instance::{Instance, InstanceGuard};
use crate::mesh::load_balancer::LoadBalancer;

/// Least connections selector.
/// Selects the admitted instance with the fewest in-flight calls.
#[derive(Debug, Default)]
pub struct LeastConnections;

impl LeastConnections {
    pub fn new() -> Self {
        Self
    }
}

impl LoadBalancer for LeastConnections {
    fn next_instance(&self, instances: &[Arc<Instance>]) -> Option<InstanceGuard> {
        // Stable sort: ties keep configuration order.
        let mut candidates: Vec<&Arc<Instance>> =
            instances.iter().filter(|i| i.admits()).collect();
        candidates.sort_by_key(|i| i.in_flight());

        candidates.into_iter().find_map(|i| i.try_acquire())
    }
}
