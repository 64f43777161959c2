//! mirror-proxy
//!
//! A caching mirror of one origin, built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌───────────────────────────────────────────────────┐
//!                      │                   MIRROR PROXY                    │
//!   Client Request     │  ┌────────┐   ┌──────────┐   ┌──────────────┐     │
//!   ───────────────────┼─▶│  http  │──▶│  proxy   │──▶│    cache     │     │
//!                      │  │ server │   │ pipeline │   │ policy+store │     │
//!                      │  └───┬────┘   └────┬─────┘   └──────────────┘     │
//!                      │      │ /health     │ miss                         │
//!                      │      ▼ /cache/*    ▼                              │
//!                      │  ┌────────┐   ┌──────────┐                        │
//!                      │  │ admin  │   │ upstream │────────────────────────┼──▶ Origin
//!                      │  └────────┘   │   pool   │                        │
//!                      │               └────┬─────┘                        │
//!   Client Response    │  ┌────────────┐    │                              │
//!   ◀──────────────────┼──│  rewrite   │◀───┘                              │
//!                      │  │ html/links │                                   │
//!                      │  └────────────┘                                   │
//!                      │  config · observability · lifecycle               │
//!                      └───────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use mirror_proxy::lifecycle::{bind_listener, resolve_config, wait_for_signal, Shutdown};
use mirror_proxy::observability::{logging, metrics};
use mirror_proxy::HttpServer;

#[derive(Parser)]
#[command(name = "mirror-proxy", version, about = "Caching mirror reverse proxy")]
struct Args {
    /// TOML configuration file; environment variables override its values
    #[arg(short, long, env = "MIRROR_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match resolve_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            logging::init_logging("info");
            tracing::error!(error = %e, "Invalid configuration");
            return Err(e.into());
        }
    };

    logging::init_logging(&config.observability.log_level);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "mirror-proxy starting");
    tracing::info!(
        origin = %config.origin.base_url(),
        bind_address = %config.listener.bind_address,
        strategy = %config.cache.strategy,
        static_only = config.cache.static_only,
        ttl_secs = config.cache.ttl_secs,
        max_entries = config.cache.max_entries,
        clear_token = config.cache.clear_token.is_some(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config)?;
    let listener = bind_listener(server.config()).await?;

    let shutdown = Shutdown::new();
    let shutdown_rx = shutdown.subscribe();
    tokio::spawn(async move {
        wait_for_signal().await;
        shutdown.trigger();
    });

    server.run(listener, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
