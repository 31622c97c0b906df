//! Auth gate middleware.
//! Rejects any request that does not carry a verifiable bearer credential.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::verifier::CredentialVerifier;
use crate::observability::metrics;

/// Result of inspecting a request's credential.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// Credential verified; continue down the pipeline.
    Proceed,
    /// No `Authorization` header, or no token after the scheme.
    RejectNoToken,
    /// A token was supplied but failed verification.
    RejectInvalidToken,
}

impl GateOutcome {
    /// Status code for a rejection, `None` for `Proceed`.
    pub fn rejection_status(self) -> Option<StatusCode> {
        match self {
            GateOutcome::Proceed => None,
            GateOutcome::RejectNoToken => Some(StatusCode::UNAUTHORIZED),
            GateOutcome::RejectInvalidToken => Some(StatusCode::FORBIDDEN),
        }
    }
}

/// Pull the token out of an `Authorization: <scheme> <token>` header.
///
/// Everything after the first space is the token. A missing header, a
/// non-ASCII header, or an empty remainder all yield `None`.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (_scheme, token) = value.split_once(' ')?;
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Decide whether a request may proceed.
pub fn authenticate(headers: &HeaderMap, verifier: &CredentialVerifier) -> GateOutcome {
    let Some(token) = extract_token(headers) else {
        return GateOutcome::RejectNoToken;
    };

    match verifier.verify(token) {
        // Claims are not forwarded or used for authorization decisions.
        Ok(_claims) => GateOutcome::Proceed,
        Err(e) => {
            tracing::debug!(reason = e.reason(), "Credential rejected");
            GateOutcome::RejectInvalidToken
        }
    }
}

pub async fn auth_gate_middleware(
    State(verifier): State<Arc<CredentialVerifier>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let outcome = authenticate(req.headers(), &verifier);

    match outcome.rejection_status() {
        None => next.run(req).await,
        Some(status) => {
            let reason = match outcome {
                GateOutcome::RejectNoToken => "missing",
                _ => "invalid",
            };
            tracing::info!(
                method = %req.method(),
                path = %req.uri().path(),
                status = status.as_u16(),
                reason,
                "Request rejected by auth gate"
            );
            metrics::record_auth_rejection(reason);
            status.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &[u8] = b"gate-secret";

    fn headers(auth: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(auth).unwrap());
        headers
    }

    fn token(secret: &[u8]) -> String {
        encode(
            &Header::default(),
            &json!({"sub": "svc"}),
            &EncodingKey::from_secret(secret),
        )
        .unwrap()
    }

    #[test]
    fn missing_header_is_no_token() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        assert_eq!(
            authenticate(&HeaderMap::new(), &verifier),
            GateOutcome::RejectNoToken
        );
    }

    #[test]
    fn scheme_without_token_is_no_token() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        assert_eq!(authenticate(&headers("Bearer"), &verifier), GateOutcome::RejectNoToken);
        assert_eq!(authenticate(&headers("Bearer "), &verifier), GateOutcome::RejectNoToken);
    }

    #[test]
    fn token_follows_first_space() {
        let h = headers("Bearer abc def");
        assert_eq!(extract_token(&h), Some("abc def"));
    }

    #[test]
    fn bad_signature_is_invalid() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let auth = format!("Bearer {}", token(b"wrong"));
        assert_eq!(
            authenticate(&headers(&auth), &verifier),
            GateOutcome::RejectInvalidToken
        );
    }

    #[test]
    fn garbage_token_is_invalid_not_missing() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        assert_eq!(
            authenticate(&headers("Bearer garbage"), &verifier),
            GateOutcome::RejectInvalidToken
        );
    }

    #[test]
    fn trailing_field_is_part_of_token() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let auth = format!("Bearer {} extra", token(SECRET));
        assert_eq!(
            authenticate(&headers(&auth), &verifier),
            GateOutcome::RejectInvalidToken
        );
    }

    #[test]
    fn scheme_is_not_checked() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let auth = format!("Token {}", token(SECRET));
        assert_eq!(authenticate(&headers(&auth), &verifier), GateOutcome::Proceed);
    }

    #[test]
    fn rejection_statuses() {
        assert_eq!(GateOutcome::Proceed.rejection_status(), None);
        assert_eq!(
            GateOutcome::RejectNoToken.rejection_status(),
            Some(StatusCode::UNAUTHORIZED)
        );
        assert_eq!(
            GateOutcome::RejectInvalidToken.rejection_status(),
            Some(StatusCode::FORBIDDEN)
        );
    }
}
