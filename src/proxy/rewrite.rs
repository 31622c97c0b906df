//! Path rewriting and upstream URI construction.

use std::borrow::Cow;

use axum::http::uri::{Authority, PathAndQuery, Scheme, Uri};
use thiserror::Error;
use url::Url;

/// A single anchored prefix substitution, e.g. `/api/` → `/`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    from: String,
    to: String,
}

impl PathRewrite {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Replace the prefix if `path` starts with it; otherwise return `path` untouched.
    pub fn apply<'a>(&self, path: &'a str) -> Cow<'a, str> {
        match path.strip_prefix(self.from.as_str()) {
            Some(rest) => Cow::Owned(format!("{}{}", self.to, rest)),
            None => Cow::Borrowed(path),
        }
    }
}

#[derive(Debug, Error)]
pub enum TargetError {
    #[error("invalid upstream URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("upstream URL has no host")]
    MissingHost,

    #[error("invalid upstream authority: {0}")]
    Authority(#[from] axum::http::uri::InvalidUri),
}

/// Parsed upstream base URL.
#[derive(Debug, Clone)]
pub struct UpstreamTarget {
    authority: Authority,
    base_path: String,
}

impl UpstreamTarget {
    pub fn parse(target: &str) -> Result<Self, TargetError> {
        let url = Url::parse(target)?;
        let host = url.host_str().ok_or(TargetError::MissingHost)?;
        let authority = match url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        };

        Ok(Self {
            authority: authority.parse()?,
            base_path: url.path().trim_end_matches('/').to_string(),
        })
    }

    /// `host[:port]` of the upstream, used as `Host` when changing origin.
    pub fn authority(&self) -> &Authority {
        &self.authority
    }

    /// Absolute upstream URI for an (already rewritten) path and optional query.
    pub fn uri_for(&self, path: &str, query: Option<&str>) -> Result<Uri, axum::http::Error> {
        let path_and_query = match query {
            Some(q) => format!("{}{}?{}", self.base_path, path, q),
            None => format!("{}{}", self.base_path, path),
        };
        let path_and_query: PathAndQuery = path_and_query.parse()?;

        Ok(Uri::builder()
            .scheme(Scheme::HTTP)
            .authority(self.authority.clone())
            .path_and_query(path_and_query)
            .build()?)
    }
}
