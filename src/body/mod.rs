//! Request body parsers.
//!
//! # Data Flow
//! ```text
//! Request not claimed by the proxy
//!     → Content-Type: application/x-www-form-urlencoded → urlencoded.rs
//!     → Content-Type: application/json or */*+json      → json.rs
//!     → anything else                                   → untouched
//!     → ParsedBody stored in request extensions, raw bytes restored as body
//! ```
//!
//! # Design Decisions
//! - Limits enforced while streaming, never after buffering everything
//! - A declared Content-Length over the limit is rejected before reading
//! - Only utf-8 bodies are decoded

pub mod json;
pub mod urlencoded;

use std::sync::Arc;

use axum::{
    body::{Body, Bytes},
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use futures_util::StreamExt;
use serde_json::Value;

use crate::config::BodyConfig;
use crate::http::error::GatewayError;

/// A request body as seen by downstream handlers.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    /// No parser ran and nothing was read.
    Unparsed,
    /// Bytes of a body no parser understood.
    Raw(Bytes),
    /// Decoded URL-encoded form.
    Form(Value),
    /// Decoded JSON document.
    Json(Value),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MediaKind {
    Form,
    Json,
}

/// Classify the request's media type and return its charset parameter, if any.
fn media_kind(headers: &HeaderMap) -> Option<(MediaKind, Option<String>)> {
    let content_type = headers.get(header::CONTENT_TYPE)?.to_str().ok()?;
    let mut params = content_type.split(';');
    let essence = params.next()?.trim().to_ascii_lowercase();

    let kind = if essence == "application/x-www-form-urlencoded" {
        MediaKind::Form
    } else if essence == "application/json"
        || (essence.contains('/') && essence.ends_with("+json"))
    {
        MediaKind::Json
    } else {
        return None;
    };

    let charset = params.find_map(|p| {
        let (name, value) = p.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_ascii_lowercase())
    });
    Some((kind, charset))
}

fn declared_length(headers: &HeaderMap) -> Option<usize> {
    headers
        .get(header::CONTENT_LENGTH)?
        .to_str()
        .ok()?
        .parse()
        .ok()
}

/// Read a body into memory, failing as soon as it exceeds `limit` bytes.
pub async fn read_limited(body: Body, limit: usize) -> Result<Bytes, GatewayError> {
    let mut stream = body.into_data_stream();
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| GatewayError::BodyMalformed(format!("request aborted: {}", e)))?;
        if buf.len() + chunk.len() > limit {
            return Err(GatewayError::BodyTooLarge { limit });
        }
        buf.extend_from_slice(&chunk);
    }
    Ok(Bytes::from(buf))
}

/// Decode a matching body and stash the result for downstream handlers.
pub async fn body_parser_middleware(
    State(config): State<Arc<BodyConfig>>,
    req: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    let Some((kind, charset)) = media_kind(req.headers()) else {
        return Ok(next.run(req).await);
    };

    if let Some(charset) = charset {
        if charset != "utf-8" && charset != "utf8" {
            return Err(GatewayError::UnsupportedCharset(charset));
        }
    }

    let limit = match kind {
        MediaKind::Form => config.urlencoded_limit_bytes,
        MediaKind::Json => config.json_limit_bytes,
    };
    if declared_length(req.headers()).is_some_and(|len| len > limit) {
        return Err(GatewayError::BodyTooLarge { limit });
    }

    let (mut parts, body) = req.into_parts();
    let bytes = read_limited(body, limit).await?;
    let parsed = match kind {
        MediaKind::Form => {
            ParsedBody::Form(urlencoded::decode(&bytes, config.extended_urlencoded)?)
        }
        MediaKind::Json => ParsedBody::Json(json::decode(&bytes)?),
    };

    parts.extensions.insert(parsed);
    Ok(next.run(Request::from_parts(parts, Body::from(bytes))).await)
}

impl<S> FromRequest<S> for ParsedBody
where
    S: Send + Sync,
{
    type Rejection = GatewayError;

    async fn from_request(req: Request, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(parsed) = req.extensions().get::<ParsedBody>() {
            return Ok(parsed.clone());
        }
        let bytes = read_limited(req.into_body(), BodyConfig::default().json_limit_bytes).await?;
        if bytes.is_empty() {
            Ok(ParsedBody::Unparsed)
        } else {
            Ok(ParsedBody::Raw(bytes))
        }
    }
}
