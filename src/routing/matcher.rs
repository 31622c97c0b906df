//! Route matching logic.
//!
//! # Responsibilities
//! - Decide whether a request falls inside the proxy mount
//!
//! # Design Decisions
//! - Path matching is a case-sensitive raw string prefix, so a mount of
//!   `/api` also claims `/api`, `/api/x` and `/apix`
//! - No regex to guarantee O(n) matching

use axum::body::Body;
use axum::http::Request;

/// Trait for matching requests against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns true if the request matches this condition.
    fn matches(&self, req: &Request<Body>) -> bool;
}

/// Matches the request path prefix.
#[derive(Debug, Clone)]
pub struct PathPrefixMatcher {
    prefix: String,
}

impl PathPrefixMatcher {
    /// Create a new path prefix matcher.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn matches_path(&self, path: &str) -> bool {
        path.starts_with(&self.prefix)
    }
}

impl Matcher for PathPrefixMatcher {
    fn matches(&self, req: &Request<Body>) -> bool {
        self.matches_path(req.uri().path())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::default()).unwrap()
    }

    #[test]
    fn test_path_matcher() {
        let matcher = PathPrefixMatcher::new("/api");

        assert!(matcher.matches(&request("http://example.com/api/v1")));
        assert!(matcher.matches(&request("/api")));
        assert!(matcher.matches(&request("/api?x=1")));
        assert!(!matcher.matches(&request("http://example.com/images")));
        assert!(!matcher.matches(&request("/healthCheck")));
    }

    #[test]
    fn test_path_matcher_is_case_sensitive() {
        let matcher = PathPrefixMatcher::new("/api");
        assert!(!matcher.matches(&request("/API/v1")));
    }
}
