//! Action proxy server.
//!
//! # Architecture Overview
//!
//! ```text
//!   Browser                    ┌──────────────────────────────────────────────┐
//!  ──────────────────────────▶ │ http::server (request id, trace, limits)     │
//!                              │     │                                        │
//!                              │     ├─ /, /tools.json, /generator.json ──▶ static_files
//!                              │     ├─ /login ─────────────┐                 │
//!                              │     ├─ /api/{action} ──────┼─▶ upstream ─────┼──▶ action endpoint
//!                              │     │        │             │                 │
//!                              │     │        └─▶ media ────┼─────────────────┼──▶ image hosts
//!                              │     └─ /upload-image ──────┴─▶ assets ───────┼──▶ asset host
//!                              └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use action_proxy::config::{load_config, ObservabilityConfig};
use action_proxy::observability::{logging, metrics};
use action_proxy::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "action-proxy", version)]
#[command(about = "Proxy for an action-based script endpoint with image inlining", long_about = None)]
struct Cli {
    /// TOML configuration file; environment variables override it.
    #[arg(short, long, env = "PROXY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen port, overriding file and environment.
    #[arg(short, long, value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Refusing to start");
            return Err(e.into());
        }
    };
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "action-proxy starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
