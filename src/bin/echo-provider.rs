use std::net::SocketAddr;
use clap::Parser;
use tonic::Code;

use circuitbreak_consumer::config::ObservabilityConfig;
use circuitbreak_consumer::lifecycle::Shutdown;
use circuitbreak_consumer::observability::logging;
use circuitbreak_consumer::provider::{self, EchoProvider};

#[derive(Parser)]
#[command(name = "echo-provider")]
#[command(about = "gRPC echo service for the circuit-breaking consumer", long_about = None)]
struct Cli {
    /// gRPC bind address.
    #[arg(short, long, default_value = "127.0.0.1:50051")]
    bind: SocketAddr,

    /// Fail every call with this numeric gRPC status code (e.g. 14 = Unavailable).
    #[arg(long)]
    fail_with: Option<i32>,

    /// With --fail-with, only fail the first N calls and recover afterwards.
    #[arg(long, requires = "fail_with")]
    fail_first: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    logging::init_logging(&ObservabilityConfig {
        log_level: "circuitbreak_consumer=debug,echo_provider=info".to_string(),
        ..ObservabilityConfig::default()
    });

    let echo = match (cli.fail_with, cli.fail_first) {
        (Some(code), Some(n)) => EchoProvider::failing_first(Code::from_i32(code), n),
        (Some(code), None) => EchoProvider::failing(Code::from_i32(code)),
        (None, _) => EchoProvider::new(),
    };

    let shutdown = Shutdown::new();
    shutdown.spawn_signal_listener();
    provider::serve(cli.bind, echo, shutdown.subscribe()).await?;
    Ok(())
}
