//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the echo handler on every path
//! - Wire up middleware (tracing, request ID, optional timeout)
//! - Bind server to listener
//! - Drain in-flight requests on shutdown

use axum::{body::Body, http::Request, Router};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::ConsumerConfig;
use crate::consumer::EchoClient;
use crate::http::handler::{echo_handler, AppState};
use crate::http::request::{propagate_request_id_layer, request_id, set_request_id_layer};

/// HTTP front end of the consumer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server forwarding to `client`.
    pub fn new(config: &ConsumerConfig, client: EchoClient) -> Self {
        let state = AppState {
            client,
            default_count: config.echo.default_count,
            response_delay: Duration::from_millis(config.echo.response_delay_ms),
        };
        let router = Self::build_router(config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// The request timeout is only applied when configured.
    #[allow(deprecated)]
    fn build_router(config: &ConsumerConfig, state: AppState) -> Router {
        let mut router = Router::new().fallback(echo_handler).with_state(state);
        if let Some(secs) = config.timeouts.request_secs {
            router = router.layer(TimeoutLayer::new(Duration::from_secs(secs)));
        }
        router
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = %request_id(request),
                )
            }))
            .layer(set_request_id_layer())
    }

    /// Serve until a shutdown signal arrives, then drain.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("HTTP server draining");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
