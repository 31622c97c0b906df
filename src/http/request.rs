//! Request identification for tracing.
//!
//! # Responsibilities
//! - Name the request ID header shared by the gateway and the upstream
//! - Build the per-request tracing span
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The ID travels upstream with the other headers and is echoed back

use std::net::SocketAddr;

use axum::{body::Body, extract::ConnectInfo, http::Request};
use tracing::Span;

/// Header carrying the per-request correlation ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Correlation ID of a request, if one has been assigned.
pub fn request_id<B>(req: &Request<B>) -> Option<&str> {
    req.headers().get(X_REQUEST_ID).and_then(|v| v.to_str().ok())
}

/// Span for one trip through the pipeline.
pub fn make_span(req: &Request<Body>) -> Span {
    let client = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string());

    tracing::info_span!(
        "request",
        method = %req.method(),
        path = %req.uri().path(),
        request_id = request_id(req).unwrap_or("unknown"),
        client = client.as_deref().unwrap_or("unknown"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_request_id_header() {
        let req = Request::builder()
            .header(X_REQUEST_ID, "abc-123")
            .body(Body::empty())
            .unwrap();
        assert_eq!(request_id(&req), Some("abc-123"));

        let bare = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(request_id(&bare), None);
    }
}
