//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, ordered pipeline)
//!     → request.rs (request ID, tracing span)
//!     → [auth gate, forwarding proxy, body parsers]
//!     → error.rs (faults rendered as JSON)
//!     → Send to client
//! ```

pub mod error;
pub mod request;
pub mod server;

pub use error::{ErrorResponder, GatewayError};
pub use request::X_REQUEST_ID;
pub use server::{build_router, HttpServer, ServerError};
