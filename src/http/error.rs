//! Gateway faults and the terminal error responder.
//!
//! # Responsibilities
//! - Define every fault the pipeline can raise, with its status code
//! - Carry the fault from the failing stage to the responder
//! - Render faults as a JSON envelope, with diagnostics outside production
//! - Turn handler panics into ordinary faults
//!
//! # Design Decisions
//! - `GatewayError::into_response` only tags the response; rendering
//!   happens once, in the responder, where the production flag is known
//! - 5xx messages are replaced by the reason phrase in production,
//!   4xx messages are safe to show and are kept
//! - Every fault is logged in both modes

use std::any::Any;
use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderValue, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type BoxError = Box<dyn StdError + Send + Sync>;

/// Every fault a pipeline stage can surface to the caller.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("upstream request failed: {0}")]
    UpstreamUnavailable(#[source] BoxError),

    #[error("upstream did not respond within {0:?}")]
    UpstreamTimeout(Duration),

    #[error("request entity too large (limit {limit} bytes)")]
    BodyTooLarge { limit: usize },

    #[error("too many parameters (limit {limit})")]
    TooManyParameters { limit: usize },

    #[error("malformed request body: {0}")]
    BodyMalformed(String),

    #[error("unsupported charset \"{0}\"")]
    UnsupportedCharset(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("handler panicked: {0}")]
    Panic(String),
}

impl GatewayError {
    pub fn status(&self) -> StatusCode {
        match self {
            GatewayError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
            GatewayError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::BodyTooLarge { .. } | GatewayError::TooManyParameters { .. } => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            GatewayError::BodyMalformed(_) => StatusCode::BAD_REQUEST,
            GatewayError::UnsupportedCharset(_) => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            GatewayError::Internal(_) | GatewayError::Panic(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Stable machine-readable fault name.
    pub fn name(&self) -> &'static str {
        match self {
            GatewayError::UpstreamUnavailable(_) => "UpstreamUnavailable",
            GatewayError::UpstreamTimeout(_) => "UpstreamTimeout",
            GatewayError::BodyTooLarge { .. } => "BodyTooLarge",
            GatewayError::TooManyParameters { .. } => "TooManyParameters",
            GatewayError::BodyMalformed(_) => "BodyMalformed",
            GatewayError::UnsupportedCharset(_) => "UnsupportedCharset",
            GatewayError::Internal(_) => "InternalError",
            GatewayError::Panic(_) => "InternalError",
        }
    }

    /// Source chain below the top-level message.
    fn details(&self) -> Vec<String> {
        let mut details = Vec::new();
        let mut source = self.source();
        while let Some(err) = source {
            details.push(err.to_string());
            source = err.source();
        }
        details
    }
}

/// Marker carried in response extensions from the failing stage to the responder.
#[derive(Clone, Debug)]
pub struct Fault(pub Arc<GatewayError>);

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let mut response = self.status().into_response();
        response.extensions_mut().insert(Fault(Arc::new(self)));
        response
    }
}

#[derive(Serialize)]
struct ErrorEnvelope<'a> {
    error: ErrorBody<'a>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    status_code: u16,
    name: &'a str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<Vec<String>>,
}

/// Render a fault into its outward JSON response.
pub fn render_fault(err: &GatewayError, production: bool) -> Response {
    let status = err.status();
    let (message, details) = if production {
        let message = if status.is_server_error() {
            status.canonical_reason().unwrap_or("Internal Server Error").to_string()
        } else {
            err.to_string()
        };
        (message, None)
    } else {
        (err.to_string(), Some(err.details()))
    };

    let envelope = ErrorEnvelope {
        error: ErrorBody {
            status_code: status.as_u16(),
            name: err.name(),
            message,
            details,
        },
    };

    let body = match serde_json::to_vec(&envelope) {
        Ok(body) => body,
        Err(_) => return status.into_response(),
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json; charset=utf-8"),
    );
    response
}

/// State for the error responder.
#[derive(Debug, Clone, Copy)]
pub struct ErrorResponder {
    pub production: bool,
}

pub async fn error_responder_middleware(
    State(responder): State<ErrorResponder>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = next.run(req).await;
    let Some(Fault(err)) = response.extensions().get::<Fault>().cloned() else {
        return response;
    };

    if err.status().is_server_error() {
        tracing::error!(
            method = %method,
            path = %path,
            status = err.status().as_u16(),
            error = %err,
            "Request failed"
        );
    } else {
        tracing::warn!(
            method = %method,
            path = %path,
            status = err.status().as_u16(),
            error = %err,
            "Request rejected"
        );
    }

    let mut rendered = render_fault(&err, responder.production);
    // Keep request-scoped headers (e.g. x-request-id) set by inner layers.
    for (name, value) in response.headers() {
        if name != header::CONTENT_TYPE && name != header::CONTENT_LENGTH {
            rendered.headers_mut().append(name.clone(), value.clone());
        }
    }
    rendered
}

/// Panic handler for `CatchPanicLayer`: turns the payload into a fault.
pub fn panic_to_fault(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };
    GatewayError::Panic(message).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn upstream_error() -> GatewayError {
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "connection refused");
        GatewayError::UpstreamUnavailable(Box::new(io))
    }

    #[test]
    fn statuses() {
        assert_eq!(upstream_error().status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            GatewayError::BodyTooLarge { limit: 1 }.status(),
            StatusCode::PAYLOAD_TOO_LARGE
        );
        assert_eq!(
            GatewayError::BodyMalformed("x".into()).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            GatewayError::Panic("boom".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn into_response_tags_fault() {
        let response = upstream_error().into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        assert!(response.extensions().get::<Fault>().is_some());
    }

    #[tokio::test]
    async fn debug_mode_includes_details() {
        let body = json_body(render_fault(&upstream_error(), false)).await;
        assert_eq!(body["error"]["statusCode"], 502);
        assert_eq!(body["error"]["name"], "UpstreamUnavailable");
        assert!(body["error"]["message"]
            .as_str()
            .unwrap()
            .contains("connection refused"));
        assert_eq!(body["error"]["details"][0], "connection refused");
    }

    #[tokio::test]
    async fn production_hides_server_error_detail() {
        let body = json_body(render_fault(&upstream_error(), true)).await;
        assert_eq!(body["error"]["message"], "Bad Gateway");
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn production_keeps_client_error_message() {
        let err = GatewayError::BodyTooLarge { limit: 10 };
        let body = json_body(render_fault(&err, true)).await;
        assert_eq!(body["error"]["statusCode"], 413);
        assert_eq!(
            body["error"]["message"],
            "request entity too large (limit 10 bytes)"
        );
    }

    #[test]
    fn panic_payloads_become_faults() {
        let response = panic_to_fault(Box::new("boom"));
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let Fault(err) = response.extensions().get::<Fault>().unwrap();
        assert_eq!(err.to_string(), "handler panicked: boom");
    }
}
