//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → form.rs (strict query/body parsing)
//!     → handler.rs (sequential echo calls over the mesh connection)
//!     → text/plain response, one line per call
//! ```

pub mod form;
pub mod handler;
pub mod request;
pub mod server;

pub use form::{parse_form, Form, FormError};
pub use handler::AppState;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
