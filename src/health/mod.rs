//! Liveness endpoint.
//!
//! Answers `GET <health.path>` with a static payload. It sits behind the
//! auth gate like every other local route.

use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::config::HealthConfig;

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn liveness() -> Json<Liveness> {
    Json(Liveness {
        status: "OK",
        version: env!("CARGO_PKG_VERSION"),
    })
}

pub fn router(config: &HealthConfig) -> Router {
    Router::new().route(&config.path, get(liveness))
}
