//! Shared harness for consumer integration tests.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use circuitbreak_consumer::config::{ConsumerConfig, ServiceConfig};
use circuitbreak_consumer::lifecycle::{self, Shutdown};
use circuitbreak_consumer::mesh::ReportInfoAnalyzer;
use circuitbreak_consumer::provider::{self, EchoProvider};

/// Start an echo provider on `addr` and give it time to bind.
pub async fn start_provider(addr: SocketAddr, echo: EchoProvider) -> Shutdown {
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = provider::serve(addr, echo, rx).await;
    });
    tokio::time::sleep(Duration::from_millis(500)).await;
    shutdown
}

/// Consumer config for `service` with the given instances, no trailing delay.
pub fn consumer_config(service: &str, instances: &[SocketAddr]) -> ConsumerConfig {
    let mut config = ConsumerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.echo.response_delay_ms = 0;
    config.mesh.target = format!("polaris://{}/", service);
    config.mesh.services.push(ServiceConfig {
        namespace: "default".into(),
        name: service.into(),
        instances: instances.iter().map(|a| a.to_string()).collect(),
    });
    config.timeouts.connect_ms = 500;
    config.timeouts.call_ms = 1_000;
    config
}

/// Dial, bind and serve a consumer. Returns its base URL and shutdown handle.
pub async fn start_consumer(
    config: ConsumerConfig,
    analyzer: Arc<dyn ReportInfoAnalyzer>,
) -> (String, Shutdown) {
    let consumer = lifecycle::prepare(config, analyzer).await.unwrap();
    let base_url = format!("http://{}", consumer.local_addr());
    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = consumer.run(rx).await;
    });
    (base_url, shutdown)
}

pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
