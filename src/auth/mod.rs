//! Authentication subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request
//!     → gate.rs (extract "<scheme> <token>" from Authorization)
//!     → verifier.rs (HMAC signature + exp/nbf checks)
//!     → Proceed, or 401 (no token) / 403 (invalid token) with empty body
//! ```
//!
//! # Design Decisions
//! - Fail closed: nothing reaches the proxy without a verified token
//! - Rejections never explain why (no body)
//! - Verified claims stay local to the gate

pub mod gate;
pub mod verifier;

pub use gate::{auth_gate_middleware, authenticate, extract_token, GateOutcome};
pub use verifier::{Claims, CredentialVerifier, VerificationError};
