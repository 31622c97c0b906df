//! HTTP server setup and pipeline composition.
//!
//! # Responsibilities
//! - Compose the ordered request pipeline into one Axum Router
//! - Bind the router to a listener with graceful shutdown
//!
//! # Pipeline
//! ```text
//! request id → trace → security headers → error responder → panic guard
//!     → auth gate → forwarding proxy ─(claimed)→ upstream
//!                        └─(not claimed)→ body parsers → local routes / 404
//! ```
//! Every stage may end the request; nothing after it then runs.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{http::StatusCode, middleware, response::IntoResponse, Router};
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    catch_panic::CatchPanicLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::auth::{auth_gate_middleware, CredentialVerifier};
use crate::body::body_parser_middleware;
use crate::config::GatewayConfig;
use crate::health;
use crate::http::error::{error_responder_middleware, panic_to_fault, ErrorResponder};
use crate::http::request::make_span;
use crate::lifecycle::ShutdownSignal;
use crate::proxy::{proxy_middleware, ForwardProxy, ProxyBuildError};
use crate::security::security_headers_middleware;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("cannot build forwarding proxy: {0}")]
    Proxy(#[from] ProxyBuildError),
}

/// HTTP server for the gateway.
pub struct HttpServer {
    router: Router,
    config: GatewayConfig,
}

impl HttpServer {
    /// Create a server with only the built-in local routes.
    pub fn new(config: GatewayConfig) -> Result<Self, ServerError> {
        Self::with_routes(config, Router::new())
    }

    /// Create a server whose non-proxied traffic also reaches `app`.
    pub fn with_routes(config: GatewayConfig, app: Router) -> Result<Self, ServerError> {
        let router = build_router(&config, app)?;
        Ok(Self { router, config })
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            upstream = %self.config.upstream.target,
            mount = %self.config.upstream.mount_path,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.recv())
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// The composed router, for in-process use.
    pub fn into_router(self) -> Router {
        self.router
    }
}

/// Build the full pipeline around the application routes.
pub fn build_router(config: &GatewayConfig, app: Router) -> Result<Router, ProxyBuildError> {
    let verifier = Arc::new(CredentialVerifier::new(&config.auth));
    let proxy = Arc::new(ForwardProxy::new(&config.upstream, &config.timeouts)?);
    let body_config = Arc::new(config.body.clone());
    let responder = ErrorResponder {
        production: config.environment.production,
    };

    let local = app
        .merge(health::router(&config.health))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(body_config, body_parser_middleware));

    Ok(local.layer(
        ServiceBuilder::new()
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(middleware::from_fn(security_headers_middleware))
            .layer(middleware::from_fn_with_state(responder, error_responder_middleware))
            .layer(CatchPanicLayer::custom(panic_to_fault))
            .layer(middleware::from_fn_with_state(verifier, auth_gate_middleware))
            .layer(middleware::from_fn_with_state(proxy, proxy_middleware)),
    ))
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
