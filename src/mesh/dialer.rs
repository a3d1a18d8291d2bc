//! Mesh-aware dialing.
//!
//! # Data Flow
//! ```text
//! dial("polaris://<service>/", options)
//!     → target.rs (parse scheme, service, namespace override)
//!     → discovery.rs (resolve instances in namespace)
//!     → instance.rs (lazy gRPC channel + breaker per instance)
//!     → pool.rs + load_balancer (selection policy)
//!     → MeshConnection
//! ```
//!
//! # Design Decisions
//! - Unreachable instances never fail the dial; channels connect lazily
//! - The report analyzer is injected here rather than registered globally

use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::config::{CircuitBreakerConfig, ConsumerConfig, LoadBalancerPolicy};
use crate::mesh::connection::MeshConnection;
use crate::mesh::discovery::{DiscoveryError, ServiceRegistry};
use crate::mesh::instance::{EndpointSettings, Instance};
use crate::mesh::load_balancer;
use crate::mesh::pool::InstancePool;
use crate::mesh::report::{DefaultAnalyzer, ReportInfoAnalyzer};
use crate::mesh::target::{Target, TargetError};
use crate::resilience::CircuitBreaker;

#[derive(Debug, Error)]
pub enum DialError {
    #[error("invalid target: {0}")]
    InvalidTarget(#[from] TargetError),

    #[error("discovery failed: {0}")]
    Discovery(#[from] DiscoveryError),

    #[error("service {service} in namespace {namespace} has no instances")]
    NoInstances { namespace: String, service: String },

    #[error("invalid endpoint {addr}: {source}")]
    Endpoint {
        addr: std::net::SocketAddr,
        #[source]
        source: tonic::transport::Error,
    },
}

/// Options controlling how a target is dialed.
#[derive(Clone)]
pub struct DialOptions {
    endpoint: EndpointSettings,
    circuit_breaker: Option<CircuitBreakerConfig>,
    namespace: String,
    load_balancer: LoadBalancerPolicy,
    analyzer: Arc<dyn ReportInfoAnalyzer>,
}

impl Default for DialOptions {
    fn default() -> Self {
        Self {
            endpoint: EndpointSettings::default(),
            circuit_breaker: None,
            namespace: "default".to_string(),
            load_balancer: LoadBalancerPolicy::default(),
            analyzer: Arc::new(DefaultAnalyzer),
        }
    }
}

impl std::fmt::Debug for DialOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DialOptions")
            .field("endpoint", &self.endpoint)
            .field("circuit_breaker", &self.circuit_breaker)
            .field("namespace", &self.namespace)
            .field("load_balancer", &self.load_balancer)
            .finish_non_exhaustive()
    }
}

impl DialOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options derived from the consumer configuration. The analyzer is
    /// left at its default.
    pub fn from_config(config: &ConsumerConfig) -> Self {
        let mut options = Self::new()
            .connect_timeout(Duration::from_millis(config.timeouts.connect_ms))
            .call_timeout(Duration::from_millis(config.timeouts.call_ms))
            .client_namespace(config.mesh.namespace.clone())
            .load_balancer(config.mesh.load_balancer);
        if config.circuit_breaker.enabled {
            options = options.enable_circuit_breaker(config.circuit_breaker.clone());
        }
        options
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint.connect_timeout = timeout;
        self
    }

    pub fn call_timeout(mut self, timeout: Duration) -> Self {
        self.endpoint.call_timeout = timeout;
        self
    }

    pub fn enable_circuit_breaker(mut self, config: CircuitBreakerConfig) -> Self {
        self.circuit_breaker = Some(config);
        self
    }

    pub fn client_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn load_balancer(mut self, policy: LoadBalancerPolicy) -> Self {
        self.load_balancer = policy;
        self
    }

    pub fn report_analyzer(mut self, analyzer: Arc<dyn ReportInfoAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }
}

/// Dial a mesh target.
///
/// Must be called from within a Tokio runtime.
pub fn dial(
    target: &str,
    registry: &dyn ServiceRegistry,
    options: DialOptions,
) -> Result<MeshConnection, DialError> {
    let target = Target::parse(target)?;
    let namespace = target
        .namespace
        .clone()
        .unwrap_or_else(|| options.namespace.clone());

    let addrs = registry.instances(&namespace, &target.service)?;
    if addrs.is_empty() {
        return Err(DialError::NoInstances {
            namespace,
            service: target.service,
        });
    }

    let mut instances = Vec::with_capacity(addrs.len());
    for addr in addrs {
        let breaker = options.circuit_breaker.as_ref().map(CircuitBreaker::new);
        let instance = Instance::connect_lazy(addr, &options.endpoint, breaker)
            .map_err(|source| DialError::Endpoint { addr, source })?;
        instances.push(Arc::new(instance));
    }

    tracing::info!(
        service = %target.service,
        namespace = %namespace,
        instances = instances.len(),
        circuit_breaker = options.circuit_breaker.is_some(),
        load_balancer = ?options.load_balancer,
        "Dialed mesh target"
    );

    let pool = InstancePool::new(
        target.service.clone(),
        instances,
        load_balancer::for_policy(options.load_balancer),
    );
    Ok(MeshConnection::new(target, namespace, pool, options.analyzer))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::discovery::StaticRegistry;

    fn registry() -> StaticRegistry {
        let mut registry = StaticRegistry::new();
        registry.register("default", "Echo", ["127.0.0.1:28431".parse().unwrap()]);
        registry.register("Test", "Echo", ["127.0.0.1:28432".parse().unwrap()]);
        registry.register("default", "Empty", std::iter::empty());
        registry
    }

    #[tokio::test]
    async fn test_dial_resolves_namespace() {
        let conn = dial("polaris://Echo/", &registry(), DialOptions::new()).unwrap();
        assert_eq!(conn.namespace(), "default");
        assert_eq!(conn.pool().all_instances()[0].addr.port(), 28431);

        let conn = dial(
            "polaris://Echo/",
            &registry(),
            DialOptions::new().client_namespace("Test"),
        )
        .unwrap();
        assert_eq!(conn.pool().all_instances()[0].addr.port(), 28432);

        let conn = dial("polaris://Echo/?namespace=Test", &registry(), DialOptions::new()).unwrap();
        assert_eq!(conn.namespace(), "Test");
    }

    #[tokio::test]
    async fn test_dial_errors() {
        assert!(matches!(
            dial("dns://Echo/", &registry(), DialOptions::new()),
            Err(DialError::InvalidTarget(_))
        ));
        assert!(matches!(
            dial("polaris://Missing/", &registry(), DialOptions::new()),
            Err(DialError::Discovery(DiscoveryError::ServiceNotFound { .. }))
        ));
        assert!(matches!(
            dial("polaris://Empty/", &registry(), DialOptions::new()),
            Err(DialError::NoInstances { .. })
        ));
    }

    #[tokio::test]
    async fn test_closed_connection_refuses_calls() {
        let conn = dial("polaris://Echo/", &registry(), DialOptions::new()).unwrap();
        conn.close();
        let err = conn
            .invoke(|_channel| async { Ok::<_, tonic::Status>(()) })
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unavailable);
        assert_eq!(err.message(), "connection closed");
    }

    #[tokio::test]
    async fn test_invoke_reports_every_outcome() {
        use crate::mesh::report::{DoneInfo, RetStatus};
        use std::sync::atomic::{AtomicUsize, Ordering};

        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let analyzer = move |info: &DoneInfo<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            match info.err {
                Some(status) => (RetStatus::Fail, status.code() as u32),
                None => (RetStatus::Success, 0),
            }
        };
        let options = DialOptions::new()
            .enable_circuit_breaker(CircuitBreakerConfig {
                enabled: true,
                failure_threshold: 2,
                sleep_window_ms: 60_000,
                half_open_successes: 1,
            })
            .report_analyzer(Arc::new(analyzer));
        let conn = dial("polaris://Echo/", &registry(), options).unwrap();

        for _ in 0..2 {
            let _ = conn
                .invoke(|_channel| async { Err::<(), _>(tonic::Status::unavailable("down")) })
                .await;
        }
        // Circuit is open now; the call never reaches the closure.
        let err = conn
            .invoke(|_channel| async { Ok::<_, tonic::Status>(()) })
            .await
            .unwrap_err();
        assert!(err.message().starts_with("no available instance for service Echo"));
        assert_eq!(seen.load(Ordering::SeqCst), 3);
    }
}
