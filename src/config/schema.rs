//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the consumer.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the circuit-breaking echo consumer.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ConsumerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Echo handler behaviour.
    pub echo: EchoConfig,

    /// Mesh target, namespace and service registry.
    pub mesh: MeshConfig,

    /// Per-instance circuit breaker settings.
    pub circuit_breaker: CircuitBreakerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address. Port 0 picks an ephemeral port.
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:0".to_string(),
        }
    }
}

/// Echo handler configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EchoConfig {
    /// Number of calls issued when `count` is absent or not positive.
    pub default_count: u32,

    /// Delay applied before the response is returned. 0 disables it.
    pub response_delay_ms: u64,
}

impl Default for EchoConfig {
    fn default() -> Self {
        Self {
            default_count: 20,
            response_delay_ms: 100,
        }
    }
}

/// Instance selection policy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancerPolicy {
    #[default]
    RoundRobin,
    LeastConnections,
}

/// Mesh client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct MeshConfig {
    /// Dial target, e.g. `polaris://CircuitBreakerEchoServerGRPC/`.
    pub target: String,

    /// Client namespace used for service lookup.
    pub namespace: String,

    /// Instance selection policy.
    pub load_balancer: LoadBalancerPolicy,

    /// Statically registered services.
    pub services: Vec<ServiceConfig>,
}

impl Default for MeshConfig {
    fn default() -> Self {
        Self {
            target: "polaris://CircuitBreakerEchoServerGRPC/".to_string(),
            namespace: "default".to_string(),
            load_balancer: LoadBalancerPolicy::default(),
            services: Vec::new(),
        }
    }
}

/// A service and its instances.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Namespace the service is registered in.
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Service name.
    pub name: String,

    /// Instance addresses (e.g., "127.0.0.1:50051").
    #[serde(default)]
    pub instances: Vec<String>,
}

fn default_namespace() -> String {
    "default".to_string()
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    /// Enable per-instance circuit breaking.
    pub enabled: bool,

    /// Consecutive failures before a circuit opens.
    pub failure_threshold: u32,

    /// Time an open circuit waits before admitting a probe, in milliseconds.
    pub sleep_window_ms: u64,

    /// Consecutive probe successes needed to close a half-open circuit.
    pub half_open_successes: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            failure_threshold: 10,
            sleep_window_ms: 30_000,
            half_open_successes: 3,
        }
    }
}

/// Timeout configuration for various operations.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// gRPC connection establishment timeout in milliseconds.
    pub connect_ms: u64,

    /// Per-call gRPC timeout in milliseconds.
    pub call_ms: u64,

    /// Total HTTP request timeout in seconds. Unset means no limit, so a
    /// long echo loop always completes with every line.
    pub request_secs: Option<u64>,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_ms: 1_000,
            call_ms: 3_000,
            request_secs: None,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "circuitbreak_consumer=info,tower_http=info".to_string(),
            log_format: LogFormat::default(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
