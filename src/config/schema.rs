//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the authenticating gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Credential verification settings.
    pub auth: AuthConfig,

    /// Upstream target and forwarding rules.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Body parser limits.
    pub body: BodyConfig,

    /// Liveness endpoint.
    pub health: HealthConfig,

    /// Deployment environment flags.
    pub environment: EnvironmentConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Credential verification settings.
#[derive(Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AuthConfig {
    /// Shared HMAC secret used to verify bearer tokens.
    pub secret: String,

    /// Clock skew tolerated when checking `exp` / `nbf`, in seconds.
    pub leeway_secs: u64,
}

// Keep the secret out of logs and panics.
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret", &"<redacted>")
            .field("leeway_secs", &self.leeway_secs)
            .finish()
    }
}

/// Upstream target configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Upstream base URL (e.g., "http://backend:3000").
    pub target: String,

    /// Requests whose path starts with this string are proxied.
    pub mount_path: String,

    /// Path prefix replaced before forwarding.
    pub rewrite_from: String,

    /// Replacement for `rewrite_from`.
    pub rewrite_to: String,

    /// Present the upstream's own host in the `Host` header.
    pub change_origin: bool,

    /// Fixed value written into the outbound `Authorization` header.
    pub authorization: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            target: String::new(),
            mount_path: "/api".to_string(),
            rewrite_from: "/api/".to_string(),
            rewrite_to: "/".to_string(),
            change_origin: true,
            authorization: String::new(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Time allowed for the upstream to return response headers, in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
        }
    }
}

/// Body parser configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BodyConfig {
    /// Maximum accepted JSON body in bytes.
    pub json_limit_bytes: usize,

    /// Maximum accepted URL-encoded body in bytes.
    pub urlencoded_limit_bytes: usize,

    /// Decode bracketed keys (`a[b]=1`) into nested values.
    pub extended_urlencoded: bool,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            json_limit_bytes: 5 * 1024 * 1024, // 5MB
            urlencoded_limit_bytes: 100 * 1024,
            extended_urlencoded: true,
        }
    }
}

/// Liveness endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthConfig {
    /// Mount path of the liveness route.
    pub path: String,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            path: "/healthCheck".to_string(),
        }
    }
}

/// Deployment environment.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct EnvironmentConfig {
    /// Suppress diagnostic detail in error responses.
    pub production: bool,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_fills_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [auth]
            secret = "s3cret"

            [upstream]
            target = "http://127.0.0.1:3000"
            authorization = "internal"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.upstream.mount_path, "/api");
        assert_eq!(config.upstream.rewrite_from, "/api/");
        assert!(config.upstream.change_origin);
        assert_eq!(config.body.json_limit_bytes, 5 * 1024 * 1024);
        assert_eq!(config.health.path, "/healthCheck");
        assert!(!config.environment.production);
        assert_eq!(config.observability.log_format, LogFormat::Pretty);
    }

    #[test]
    fn auth_debug_redacts_secret() {
        let auth = AuthConfig {
            secret: "do-not-print".into(),
            leeway_secs: 0,
        };
        let rendered = format!("{:?}", auth);
        assert!(!rendered.contains("do-not-print"));
    }
}
