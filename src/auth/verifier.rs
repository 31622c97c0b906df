//! Bearer credential verification.
//!
//! # Responsibilities
//! - Decode a signed token and check its HMAC signature
//! - Enforce `exp` / `nbf` when the token carries them
//! - Classify failures as malformed vs. invalid
//!
//! # Design Decisions
//! - Only the HMAC family (HS256/HS384/HS512) is accepted; a token
//!   announcing any other algorithm is rejected as invalid
//! - `exp` is optional, matching tokens minted without an expiry
//! - Pure: never logs the token or its claims

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::config::AuthConfig;

/// Decoded payload of a verified token.
pub type Claims = Map<String, Value>;

/// Why a token failed verification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerificationError {
    /// The token could not be decoded at all.
    #[error("malformed token: {0}")]
    Malformed(String),

    /// The token decoded but its signature, algorithm or validity window is wrong.
    #[error("invalid token: {0}")]
    Invalid(String),
}

impl VerificationError {
    /// Stable label used in metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            VerificationError::Malformed(_) => "malformed",
            VerificationError::Invalid(_) => "invalid",
        }
    }
}

impl From<jsonwebtoken::errors::Error> for VerificationError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidToken
            | ErrorKind::Base64(_)
            | ErrorKind::Json(_)
            | ErrorKind::Utf8(_)
            | ErrorKind::InvalidAlgorithmName => VerificationError::Malformed(err.to_string()),
            _ => VerificationError::Invalid(err.to_string()),
        }
    }
}

/// Verifies bearer tokens against the process-wide shared secret.
#[derive(Clone)]
pub struct CredentialVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl CredentialVerifier {
    /// Build a verifier from the auth configuration.
    pub fn new(config: &AuthConfig) -> Self {
        Self::from_secret(config.secret.as_bytes(), config.leeway_secs)
    }

    /// Build a verifier from a raw HMAC secret.
    pub fn from_secret(secret: &[u8], leeway_secs: u64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.required_spec_claims.clear();
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.validate_aud = false;
        validation.leeway = leeway_secs;

        Self {
            key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    /// Verify `token`, returning its claims on success.
    pub fn verify(&self, token: &str) -> Result<Claims, VerificationError> {
        if token.is_empty() {
            return Err(VerificationError::Malformed("empty token".into()));
        }
        let data = decode::<Claims>(token, &self.key, &self.validation)?;
        Ok(data.claims)
    }
}

impl std::fmt::Debug for CredentialVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"test-secret";

    fn now() -> u64 {
        SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs()
    }

    fn sign(alg: Algorithm, claims: Value, secret: &[u8]) -> String {
        encode(&Header::new(alg), &claims, &EncodingKey::from_secret(secret)).unwrap()
    }

    #[test]
    fn accepts_token_without_expiry() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let token = sign(Algorithm::HS256, json!({"sub": "alice"}), SECRET);
        let claims = verifier.verify(&token).unwrap();
        assert_eq!(claims.get("sub"), Some(&json!("alice")));
    }

    #[test]
    fn accepts_whole_hmac_family() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        for alg in [Algorithm::HS384, Algorithm::HS512] {
            let token = sign(alg, json!({"sub": "bob"}), SECRET);
            assert!(verifier.verify(&token).is_ok(), "{:?} should verify", alg);
        }
    }

    #[test]
    fn wrong_secret_is_invalid() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let token = sign(Algorithm::HS256, json!({"sub": "mallory"}), b"other-secret");
        assert!(matches!(
            verifier.verify(&token),
            Err(VerificationError::Invalid(_))
        ));
    }

    #[test]
    fn expired_token_is_invalid() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let token = sign(Algorithm::HS256, json!({"exp": now() - 120}), SECRET);
        assert!(matches!(
            verifier.verify(&token),
            Err(VerificationError::Invalid(_))
        ));
    }

    #[test]
    fn leeway_tolerates_recent_expiry() {
        let verifier = CredentialVerifier::from_secret(SECRET, 300);
        let token = sign(Algorithm::HS256, json!({"exp": now() - 120}), SECRET);
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn future_not_before_is_invalid() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let token = sign(Algorithm::HS256, json!({"nbf": now() + 3600}), SECRET);
        assert!(matches!(
            verifier.verify(&token),
            Err(VerificationError::Invalid(_))
        ));
    }

    #[test]
    fn garbage_is_malformed() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let err = verifier.verify("not-a-jwt").unwrap_err();
        assert_eq!(err.reason(), "malformed");
        assert_eq!(
            verifier.verify("").unwrap_err().reason(),
            "malformed"
        );
    }

    #[test]
    fn audience_claim_is_not_enforced() {
        let verifier = CredentialVerifier::from_secret(SECRET, 0);
        let token = sign(Algorithm::HS256, json!({"aud": "billing"}), SECRET);
        assert!(verifier.verify(&token).is_ok());
    }
}
