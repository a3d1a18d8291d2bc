//! Mesh-aware gRPC client.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     dialer.rs (target + options) → discovery.rs → pool.rs → MeshConnection
//!
//! Per call (connection.rs):
//!     pool.rs → load_balancer (instance + breaker admission)
//!     → unary call on instance channel
//!     → report.rs analyzer → (RetStatus, code)
//!     → instance breaker updated
//! ```
//!
//! # Design Decisions
//! - One lazily connected channel per instance
//! - Every call outcome is classified exactly once, even when no instance was picked
//! - Connection handle is `Clone` and shared across request tasks

pub mod connection;
pub mod dialer;
pub mod discovery;
pub mod instance;
pub mod load_balancer;
pub mod pool;
pub mod report;
pub mod target;

pub use connection::MeshConnection;
pub use dialer::{dial, DialError, DialOptions};
pub use discovery::{DiscoveryError, ServiceRegistry, StaticRegistry};
pub use report::{DefaultAnalyzer, DoneInfo, ReportInfoAnalyzer, RetStatus};
pub use target::{Target, TargetError};
