//! Security response headers.
//!
//! # Responsibilities
//! - Add a fixed set of hardening headers to every response
//! - Cover rejected, errored and proxied responses alike
//!
//! # Design Decisions
//! - The header set is static and not configurable
//! - A header the upstream already set is left alone, so an upstream
//!   that deliberately relaxes e.g. framing keeps its own policy

use axum::{
    body::Body,
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::Response,
};

/// Hardening headers applied to every response.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    (
        "content-security-policy",
        "default-src 'self';base-uri 'self';font-src 'self' https: data:;form-action 'self';\
         frame-ancestors 'self';img-src 'self' data:;object-src 'none';script-src 'self';\
         script-src-attr 'none';style-src 'self' https: 'unsafe-inline';upgrade-insecure-requests",
    ),
    ("cross-origin-opener-policy", "same-origin"),
    ("cross-origin-resource-policy", "same-origin"),
    ("origin-agent-cluster", "?1"),
    ("referrer-policy", "no-referrer"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-content-type-options", "nosniff"),
    ("x-dns-prefetch-control", "off"),
    ("x-download-options", "noopen"),
    ("x-frame-options", "SAMEORIGIN"),
    ("x-permitted-cross-domain-policies", "none"),
    ("x-xss-protection", "0"),
];

/// Insert every missing hardening header into `headers`.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers
            .entry(HeaderName::from_static(*name))
            .or_insert_with(|| HeaderValue::from_static(*value));
    }
    headers.remove("x-powered-by");
}

pub async fn security_headers_middleware(req: Request<Body>, next: Next) -> Response {
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut());
    response
}

/// True when every hardening header is present.
pub fn has_security_headers(headers: &HeaderMap) -> bool {
    SECURITY_HEADERS
        .iter()
        .all(|(name, _)| headers.contains_key(*name))
        && !headers.contains_key("x-powered-by")
}
