//! Echo provider: the gRPC service the consumer dials.
//!
//! Returns every request value unchanged, or, in failure mode, answers
//! calls with a fixed status code so the consumer's circuit breaker has
//! something to trip on. A provider can fail only its first calls and
//! then recover.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tonic::{transport::Server, Code, Request, Response, Status};

use crate::pb::{EchoRequest, EchoResponse, EchoServer, EchoServerServer};

#[derive(Debug, Clone, Default)]
pub struct EchoProvider {
    fail_with: Option<Code>,
    fail_limit: u64,
    served: Arc<AtomicU64>,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// A provider that fails every call with `code`.
    pub fn failing(code: Code) -> Self {
        Self::failing_first(code, u64::MAX)
    }

    /// A provider that fails its first `calls` calls with `code`, then echoes.
    pub fn failing_first(code: Code, calls: u64) -> Self {
        Self {
            fail_with: Some(code),
            fail_limit: calls,
            served: Arc::default(),
        }
    }

    /// Calls received so far, successful or not.
    pub fn served(&self) -> u64 {
        self.served.load(Ordering::Relaxed)
    }
}

#[tonic::async_trait]
impl EchoServer for EchoProvider {
    async fn echo(&self, request: Request<EchoRequest>) -> Result<Response<EchoResponse>, Status> {
        let count = self.served.fetch_add(1, Ordering::Relaxed) + 1;
        let value = request.into_inner().value;

        if let Some(code) = self.fail_with.filter(|_| count <= self.fail_limit) {
            tracing::debug!(request = count, value = %value, code = ?code, "Failing echo");
            return Err(Status::new(code, "echo provider configured to fail"));
        }

        tracing::debug!(request = count, value = %value, "Echo");
        Ok(Response::new(EchoResponse { value }))
    }
}

/// Serve `provider` on `addr` until shutdown.
pub async fn serve(
    addr: SocketAddr,
    provider: EchoProvider,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<(), tonic::transport::Error> {
    tracing::info!(address = %addr, failing = ?provider.fail_with, "Echo provider starting");
    Server::builder()
        .add_service(EchoServerServer::new(provider))
        .serve_with_shutdown(addr, async move {
            let _ = shutdown.recv().await;
        })
        .await?;
    tracing::info!("Echo provider stopped");
    Ok(())
}
