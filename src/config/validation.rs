//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check the upstream target is a usable http URL
//! - Detect the liveness route shadowed by the proxy mount
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("auth.secret must not be empty")]
    MissingSecret,

    #[error("upstream.target must not be empty")]
    MissingTarget,

    #[error("upstream.target '{0}' is not a valid URL")]
    InvalidTarget(String),

    #[error("upstream.target scheme '{0}' is not supported (expected http)")]
    UnsupportedScheme(String),

    #[error("upstream.authorization must not be empty")]
    MissingAuthorizationOverride,

    #[error("{field} must start with '/' (got '{value}')")]
    RelativePath { field: &'static str, value: String },

    #[error("health.path '{0}' is shadowed by upstream.mount_path")]
    HealthShadowed(String),

    #[error("{0} must be greater than zero")]
    Zero(&'static str),

    #[error("listener.bind_address '{0}' is not a socket address")]
    InvalidBindAddress(String),
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<std::net::SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.auth.secret.is_empty() {
        errors.push(ValidationError::MissingSecret);
    }

    let upstream = &config.upstream;
    if upstream.target.is_empty() {
        errors.push(ValidationError::MissingTarget);
    } else {
        match Url::parse(&upstream.target) {
            Ok(url) if url.scheme() != "http" => {
                errors.push(ValidationError::UnsupportedScheme(url.scheme().to_string()));
            }
            Ok(url) if url.host_str().is_none() => {
                errors.push(ValidationError::InvalidTarget(upstream.target.clone()));
            }
            Ok(_) => {}
            Err(_) => errors.push(ValidationError::InvalidTarget(upstream.target.clone())),
        }
    }

    if upstream.authorization.is_empty() {
        errors.push(ValidationError::MissingAuthorizationOverride);
    }

    for (field, value) in [
        ("upstream.mount_path", &upstream.mount_path),
        ("upstream.rewrite_from", &upstream.rewrite_from),
        ("upstream.rewrite_to", &upstream.rewrite_to),
        ("health.path", &config.health.path),
    ] {
        if !value.starts_with('/') {
            errors.push(ValidationError::RelativePath {
                field,
                value: value.clone(),
            });
        }
    }

    if config.health.path.starts_with(&upstream.mount_path) {
        errors.push(ValidationError::HealthShadowed(config.health.path.clone()));
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.connect_secs"));
    }
    if config.timeouts.upstream_secs == 0 {
        errors.push(ValidationError::Zero("timeouts.upstream_secs"));
    }
    if config.body.json_limit_bytes == 0 {
        errors.push(ValidationError::Zero("body.json_limit_bytes"));
    }
    if config.body.urlencoded_limit_bytes == 0 {
        errors.push(ValidationError::Zero("body.urlencoded_limit_bytes"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
