//! Startup orchestration.
//!
//! # Responsibilities
//! - Build the service registry from configuration
//! - Dial the mesh target with the injected report analyzer
//! - Bind the HTTP listener
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Dial before bind, so traffic only arrives once the connection exists

use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::ConsumerConfig;
use crate::consumer::EchoClient;
use crate::http::HttpServer;
use crate::observability::metrics;
use crate::mesh::{dial, DialError, DialOptions, DiscoveryError, MeshConnection, ReportInfoAnalyzer, StaticRegistry};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid service registry: {0}")]
    Registry(#[from] DiscoveryError),

    #[error("failed to dial mesh target: {0}")]
    Dial(#[from] DialError),

    #[error("failed to listen addr {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },
}

/// A consumer that is dialed and bound but not yet serving.
pub struct Consumer {
    server: HttpServer,
    listener: TcpListener,
    connection: MeshConnection,
    local_addr: SocketAddr,
}

impl Consumer {
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serve until shutdown, then close the mesh connection.
    pub async fn run(self, shutdown: broadcast::Receiver<()>) -> Result<(), std::io::Error> {
        let result = self.server.run(self.listener, shutdown).await;
        self.connection.close();
        result
    }
}

/// Dial the configured target and bind the listener.
///
/// `config` is expected to be validated already.
pub async fn prepare(
    config: ConsumerConfig,
    analyzer: Arc<dyn ReportInfoAnalyzer>,
) -> Result<Consumer, StartupError> {
    let registry = StaticRegistry::from_config(&config.mesh.services)?;
    let options = DialOptions::from_config(&config).report_analyzer(analyzer);
    let connection = dial(&config.mesh.target, &registry, options)?;

    let addr = config.listener.bind_address.clone();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|source| StartupError::Bind { addr: addr.clone(), source })?;
    let local_addr = listener
        .local_addr()
        .map_err(|source| StartupError::Bind { addr, source })?;

    for instance in connection.pool().all_instances() {
        metrics::record_circuit_state(&instance.addr.to_string(), instance.circuit_state());
    }
    tracing::info!(
        address = %local_addr,
        service = connection.pool().service(),
        namespace = connection.namespace(),
        "Listening for connections"
    );

    let server = HttpServer::new(&config, EchoClient::new(connection.clone()));
    Ok(Consumer {
        server,
        listener,
        connection,
        local_addr,
    })
}
