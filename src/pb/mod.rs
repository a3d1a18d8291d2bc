//! Protocol buffer types and gRPC stubs for the echo service.
//!
//! Generated by `build.rs` from `proto/echo.proto`.

tonic::include_proto!("echo");

pub use echo_server_client::EchoServerClient;
pub use echo_server_server::{EchoServer, EchoServerServer};
