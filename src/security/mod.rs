//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Every response, on the way out:
//!     → headers.rs (add hardening headers)
//!     → Send to client
//! ```
//!
//! # Design Decisions
//! - Outermost pipeline stage: runs for rejections and faults too
//! - No failure path of its own

pub mod headers;

pub use headers::{apply_security_headers, security_headers_middleware, SECURITY_HEADERS};
