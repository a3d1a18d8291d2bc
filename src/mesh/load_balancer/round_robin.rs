//! Round-robin load balancing strategy.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::mesh::instance::{Instance, InstanceGuard};
use crate::mesh::load_balancer::LoadBalancer;

/// Round-robin selector.
/// Stores an internal counter to rotate through instances.
#[derive(Debug, Default)]
pub struct RoundRobin {
    counter: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn next_instance(&self, instances: &[Arc<Instance>]) -> Option<InstanceGuard> {
        if instances.is_empty() {
            return None;
        }

        // Each instance is tried at most once per selection.
        let start_count = self.counter.fetch_add(1, Ordering::Relaxed);
        let len = instances.len();

        for i in 0..len {
            let index = (start_count + i) % len;
            if let Some(guard) = instances[index].try_acquire() {
                return Some(guard);
            }
        }
        None
    }
}
