//! Authenticating reverse-proxy gateway.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌──────────────────────────────────────────────────────┐
//!                     │                    AUTH GATEWAY                      │
//!                     │                                                      │
//!  Client Request     │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!  ───────────────────┼─▶│ security │──▶│   auth   │──▶│ forwarding proxy │──┼──▶ Upstream
//!                     │  │ headers  │   │   gate   │   │ (/api → rewrite) │  │
//!                     │  └──────────┘   └────┬─────┘   └────────┬─────────┘  │
//!                     │                      │ 401/403          │ not /api   │
//!                     │                      ▼                  ▼            │
//!  Client Response    │               ┌─────────────┐   ┌──────────────────┐ │
//!  ◀──────────────────┼───────────────│    error    │◀──│  body parsers +  │ │
//!                     │               │  responder  │   │  /healthCheck    │ │
//!                     │               └─────────────┘   └──────────────────┘ │
//!                     └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tokio::net::TcpListener;
use tracing::{error, info};

use auth_gateway::config::{load_config, ObservabilityConfig};
use auth_gateway::lifecycle::shutdown_on_signal;
use auth_gateway::observability::{init_logging, metrics};
use auth_gateway::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "auth-gateway")]
#[command(about = "Authenticating reverse proxy", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long, env = "GATEWAY_CONFIG")]
    config: Option<PathBuf>,

    /// Validate configuration and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    // A missing .env file is normal.
    let _ = dotenvy::dotenv();

    match run(cli).await {
        Ok(()) => ExitCode::from(exitcode::OK as u8),
        Err(code) => ExitCode::from(code as u8),
    }
}

async fn run(cli: Cli) -> Result<(), exitcode::ExitCode> {
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            init_logging(&ObservabilityConfig::default());
            error!("Configuration error: {e}");
            return Err(exitcode::CONFIG);
        }
    };

    init_logging(&config.observability);
    info!("auth-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    info!(
        bind_address = %config.listener.bind_address,
        upstream = %config.upstream.target,
        production = config.environment.production,
        "Configuration loaded"
    );

    if cli.check {
        info!("Configuration is valid");
        return Ok(());
    }

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|e| {
            error!("Failed to bind to {}: {e}", config.listener.bind_address);
            exitcode::UNAVAILABLE
        })?;

    let server = HttpServer::new(config).map_err(|e| {
        error!("Failed to build pipeline: {e}");
        exitcode::CONFIG
    })?;

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown_on_signal(shutdown.clone()));

    server.run(listener, shutdown.subscribe()).await.map_err(|e| {
        error!("Server error: {e}");
        exitcode::SOFTWARE
    })?;

    info!("Shutdown complete");
    Ok(())
}
