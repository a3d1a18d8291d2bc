//! Circuit-breaking echo consumer.
//!
//! # Architecture Overview
//!
//! ```text
//!     HTTP client                ┌──────────────────────────────────────────────┐
//!     ?value=..&count=N          │              CONSUMER                        │
//!     ───────────────────────────┼─▶ http::server ─▶ http::form ─▶ handler     │
//!                                │                                  │ N times   │
//!                                │                                  ▼           │
//!                                │          mesh::connection (invoke)           │
//!                                │      pool ─▶ load_balancer ─▶ instance       │
//!                                │                                  │           │
//!                                │      report analyzer ◀── outcome ┤           │
//!                                │      (consumer::classifier)      │           │
//!                                │             │                    ▼           │
//!                                │             └─▶ circuit breaker  gRPC ───────┼──▶ echo
//!     ◀──────────────────────────┼── one line per call                          │    provider
//!                                └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use clap::Parser;

use circuitbreak_consumer::config::loader::{read_config, ConfigError};
use circuitbreak_consumer::config::validation::validate_config;
use circuitbreak_consumer::config::{ConsumerConfig, ServiceConfig};
use circuitbreak_consumer::consumer::Classifier;
use circuitbreak_consumer::lifecycle::{self, Shutdown};
use circuitbreak_consumer::mesh::Target;
use circuitbreak_consumer::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "circuitbreak-consumer")]
#[command(about = "HTTP front end forwarding echo calls over a circuit-breaking mesh connection", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// HTTP bind address, e.g. 0.0.0.0:0.
    #[arg(long)]
    bind: Option<String>,

    /// Mesh target, e.g. polaris://CircuitBreakerEchoServerGRPC/.
    #[arg(long)]
    target: Option<String>,

    /// Client namespace.
    #[arg(long)]
    namespace: Option<String>,

    /// Register an instance for the target service. Repeatable.
    #[arg(long = "instance")]
    instances: Vec<String>,
}

impl Cli {
    fn apply(&self, config: &mut ConsumerConfig) {
        if let Some(bind) = &self.bind {
            config.listener.bind_address = bind.clone();
        }
        if let Some(target) = &self.target {
            config.mesh.target = target.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.mesh.namespace = namespace.clone();
        }
        if self.instances.is_empty() {
            return;
        }
        // An unparsable target is reported by validation.
        if let Ok(target) = Target::parse(&config.mesh.target) {
            let namespace = target.namespace.unwrap_or_else(|| config.mesh.namespace.clone());
            config.mesh.services.retain(|s| !(s.namespace == namespace && s.name == target.service));
            config.mesh.services.push(ServiceConfig {
                namespace,
                name: target.service,
                instances: self.instances.clone(),
            });
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => read_config(path)?,
        None => ConsumerConfig::default(),
    };
    cli.apply(&mut config);

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "circuitbreak-consumer starting");

    if let Err(errors) = validate_config(&config) {
        let err = ConfigError::Validation(errors);
        tracing::error!(error = %err, "Invalid configuration");
        return Err(err.into());
    }

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mesh_target = %config.mesh.target,
        namespace = %config.mesh.namespace,
        circuit_breaker = config.circuit_breaker.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr)?;
    }

    let consumer = match lifecycle::prepare(config, Arc::new(Classifier)).await {
        Ok(consumer) => consumer,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return Err(e.into());
        }
    };
    println!("listen address is {}", consumer.local_addr());

    let shutdown = Shutdown::new();
    shutdown.spawn_signal_listener();
    consumer.run(shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
