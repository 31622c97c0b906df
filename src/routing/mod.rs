//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → matcher.rs (is the path inside the proxy mount?)
//!     → yes: Forwarding Proxy terminates the chain
//!     → no: body parsers and local routes
//! ```
//!
//! # Design Decisions
//! - Matchers built at startup, immutable at runtime
//! - Deterministic: same input always matches the same way

pub mod matcher;

pub use matcher::{Matcher, PathPrefixMatcher};
