//! Forwarding proxy.
//!
//! # Responsibilities
//! - Claim requests inside the proxy mount, pass everything else on
//! - Rewrite the path and point the request at the upstream
//! - Overwrite `Authorization`, optionally change origin
//! - Stream request and response bodies without buffering
//! - Map transport failures to 502 and slow upstreams to 504
//!
//! # Design Decisions
//! - No retries, no load balancing: one static upstream
//! - If the client goes away the handler future is dropped, which drops
//!   the in-flight upstream request and closes its connection

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, Version},
    middleware::Next,
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::config::{TimeoutConfig, UpstreamConfig};
use crate::http::error::GatewayError;
use crate::observability::metrics;
use crate::proxy::headers::{override_authorization, strip_hop_by_hop};
use crate::proxy::rewrite::{PathRewrite, TargetError, UpstreamTarget};
use crate::routing::{Matcher, PathPrefixMatcher};

#[derive(Debug, Error)]
pub enum ProxyBuildError {
    #[error(transparent)]
    Target(#[from] TargetError),

    #[error("upstream.authorization is not a valid header value")]
    Authorization(#[from] axum::http::header::InvalidHeaderValue),
}

/// Forwards authenticated requests to the configured upstream.
#[derive(Debug, Clone)]
pub struct ForwardProxy {
    client: Client<HttpConnector, Body>,
    scope: PathPrefixMatcher,
    rewrite: PathRewrite,
    target: UpstreamTarget,
    change_origin: bool,
    authorization: HeaderValue,
    upstream_timeout: Duration,
}

impl ForwardProxy {
    pub fn new(
        upstream: &UpstreamConfig,
        timeouts: &TimeoutConfig,
    ) -> Result<Self, ProxyBuildError> {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);

        let mut authorization = HeaderValue::from_str(&upstream.authorization)?;
        authorization.set_sensitive(true);

        Ok(Self {
            client,
            scope: PathPrefixMatcher::new(upstream.mount_path.clone()),
            rewrite: PathRewrite::new(upstream.rewrite_from.clone(), upstream.rewrite_to.clone()),
            target: UpstreamTarget::parse(&upstream.target)?,
            change_origin: upstream.change_origin,
            authorization,
            upstream_timeout: Duration::from_secs(timeouts.upstream_secs),
        })
    }

    /// Whether this request belongs to the proxy.
    pub fn claims(&self, req: &Request<Body>) -> bool {
        self.scope.matches(req)
    }

    /// Build the outbound request from the inbound one.
    pub fn prepare(&self, req: Request<Body>) -> Result<Request<Body>, GatewayError> {
        let (mut parts, body) = req.into_parts();

        let path = self.rewrite.apply(parts.uri.path());
        let uri = self
            .target
            .uri_for(&path, parts.uri.query())
            .map_err(|e| GatewayError::Internal(format!("cannot build upstream URI: {}", e)))?;

        strip_hop_by_hop(&mut parts.headers);
        override_authorization(&mut parts.headers, &self.authorization);

        if self.change_origin {
            let host = HeaderValue::from_str(self.target.authority().as_str())
                .map_err(|e| GatewayError::Internal(format!("invalid upstream host: {}", e)))?;
            parts.headers.insert(header::HOST, host);
        } else if !parts.headers.contains_key(header::HOST) {
            // HTTP/2 clients send :authority instead of Host.
            if let Some(authority) = parts.uri.authority() {
                if let Ok(host) = HeaderValue::from_str(authority.as_str()) {
                    parts.headers.insert(header::HOST, host);
                }
            }
        }

        parts.uri = uri;
        parts.version = Version::HTTP_11;

        Ok(Request::from_parts(parts, body))
    }

    /// Send a request upstream and relay the response.
    pub async fn forward(&self, req: Request<Body>) -> Result<Response, GatewayError> {
        let outbound = self.prepare(req)?;
        tracing::debug!(method = %outbound.method(), uri = %outbound.uri(), "Forwarding upstream");

        let upstream = self.client.request(outbound);
        let response = match tokio::time::timeout(self.upstream_timeout, upstream).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                metrics::record_upstream_error("transport");
                return Err(GatewayError::UpstreamUnavailable(Box::new(e)));
            }
            Err(_) => {
                metrics::record_upstream_error("timeout");
                return Err(GatewayError::UpstreamTimeout(self.upstream_timeout));
            }
        };

        let (mut parts, body) = response.into_parts();
        strip_hop_by_hop(&mut parts.headers);
        Ok(Response::from_parts(parts, Body::new(body)))
    }
}

pub async fn proxy_middleware(
    State(proxy): State<Arc<ForwardProxy>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !proxy.claims(&req) {
        return next.run(req).await;
    }

    let start_time = Instant::now();
    let method = req.method().to_string();
    let path = req.uri().path().to_string();

    match proxy.forward(req).await {
        Ok(response) => {
            tracing::debug!(
                method = %method,
                path = %path,
                status = response.status().as_u16(),
                "Upstream responded"
            );
            metrics::record_request(&method, response.status().as_u16(), "proxied", start_time);
            response
        }
        Err(e) => {
            metrics::record_request(&method, e.status().as_u16(), "upstream_error", start_time);
            e.into_response()
        }
    }
}
