//! Consumer side of the echo demo: the result classifier injected into the
//! mesh dialer and the echo client used by the HTTP handler.

pub mod classifier;
pub mod client;

pub use classifier::{classify, Classifier};
pub use client::EchoClient;
