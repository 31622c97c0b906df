//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    Env { key: &'static str, value: String },

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration from an optional TOML file, apply process environment
/// overrides, then validate.
pub fn load_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => GatewayConfig::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Overlay environment-provided values onto `config`.
///
/// Recognised keys: `ACCESS_TOKEN_SECRET`, `TARGET_DOMAIN`,
/// `UPSTREAM_AUTHORIZATION`, `PORT`, `ENV`, `LOG_LEVEL`.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(secret) = lookup("ACCESS_TOKEN_SECRET") {
        config.auth.secret = secret;
    }
    if let Some(target) = lookup("TARGET_DOMAIN") {
        config.upstream.target = target;
    }
    if let Some(authorization) = lookup("UPSTREAM_AUTHORIZATION") {
        config.upstream.authorization = authorization;
    }
    if let Some(port) = lookup("PORT") {
        let port: u16 = port.parse().map_err(|_| ConfigError::Env {
            key: "PORT",
            value: port.clone(),
        })?;
        config.listener.bind_address = with_port(&config.listener.bind_address, port);
    }
    if let Some(env) = lookup("ENV") {
        config.environment.production = env == "prod";
    }
    if let Some(level) = lookup("LOG_LEVEL") {
        config.observability.log_level = level;
    }
    Ok(())
}

fn with_port(bind_address: &str, port: u16) -> String {
    let host = bind_address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or("0.0.0.0");
    format!("{}:{}", host, port)
}
