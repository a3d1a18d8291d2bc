//! Metrics collection and exposition.
//!
//! # Metrics
//! - `mesh_calls_total` (counter): calls by service, result, code
//! - `mesh_call_duration_seconds` (histogram): call latency by service
//! - `mesh_circuit_open` (gauge): 1=open or half-open, 0=closed, per instance
//! - `echo_http_requests_total` (counter): HTTP requests by status

use std::net::SocketAddr;
use std::time::Duration;
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use crate::mesh::report::RetStatus;
use crate::resilience::CircuitState;

/// Install the Prometheus recorder and its scrape listener.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()?;
    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

pub fn record_call(service: &str, result: RetStatus, code: u32, elapsed: Duration) {
    ::metrics::counter!(
        "mesh_calls_total",
        "service" => service.to_string(),
        "result" => result.as_str(),
        "code" => code.to_string()
    )
    .increment(1);
    ::metrics::histogram!("mesh_call_duration_seconds", "service" => service.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_circuit_state(instance: &str, state: CircuitState) {
    let value = match state {
        CircuitState::Closed => 0.0,
        CircuitState::Open | CircuitState::HalfOpen => 1.0,
    };
    ::metrics::gauge!("mesh_circuit_open", "instance" => instance.to_string()).set(value);
}

pub fn record_http_request(status: u16) {
    ::metrics::counter!("echo_http_requests_total", "status" => status.to_string()).increment(1);
}
