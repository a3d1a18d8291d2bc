//! Instance selection.
//!
//! # Data Flow
//! ```text
//! Call issued on a connection
//!     → pool.rs (instances of the dialed service)
//!     → Apply load balancing algorithm:
//!         - round_robin.rs (rotate through instances)
//!         - least_conn.rs (pick instance with fewest in-flight calls)
//!     → instance.rs (breaker admission + in-flight guard)
//!     → Return guard or None
//! ```
//!
//! # Design Decisions
//! - Load balancer holds no instance state; instances track their own
//! - Instances whose breaker refuses are skipped, never waited on
//! - At most one breaker admission is taken per selection

use std::sync::Arc;

use crate::config::LoadBalancerPolicy;
use crate::mesh::instance::{Instance, InstanceGuard};

pub mod least_conn;
pub mod round_robin;

pub use least_conn::LeastConnections;
pub use round_robin::RoundRobin;

/// Selects the instance that serves the next call.
pub trait LoadBalancer: Send + Sync + std::fmt::Debug {
    fn next_instance(&self, instances: &[Arc<Instance>]) -> Option<InstanceGuard>;
}

/// Build the balancer for a configured policy.
pub fn for_policy(policy: LoadBalancerPolicy) -> Box<dyn LoadBalancer> {
    match policy {
        LoadBalancerPolicy::RoundRobin => Box::new(RoundRobin::new()),
        LoadBalancerPolicy::LeastConnections => Box::new(LeastConnections::new()),
    }
}
