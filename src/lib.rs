//! Authenticating reverse-proxy gateway library.
//!
//! Verifies a bearer token on every request and forwards authorized
//! traffic under the proxy mount to a single upstream, rewriting the path
//! and replacing the outbound credential.

pub mod auth;
pub mod body;
pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod routing;
pub mod security;

pub use config::GatewayConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
