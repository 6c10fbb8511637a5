//! Media relay server.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │                 MEDIA RELAY                   │
//!     Browser player     │  ┌────────┐    ┌──────────┐    ┌──────────┐  │
//!     ───────────────────┼─▶│  http  │───▶│  relay   │───▶│ upstream │──┼──▶ Origin
//!     ◀──────────────────┼──│ server │◀───│ redirect │◀───│  client  │◀─┼─── (CDN)
//!                        │  └───┬────┘    │  + body  │    └──────────┘  │
//!                        │      │         └──────────┘                  │
//!                        │      ▼                                       │
//!                        │  ┌────────┐   immutable snapshot, loaded     │
//!                        │  │catalog │   once from per-category JSON    │
//!                        │  └────────┘                                  │
//!                        │  config · observability · lifecycle          │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use media_relay::config::{load_config, validate_config, ConfigError, RelayConfig};
use media_relay::lifecycle::{wait_for_signal, Shutdown};
use media_relay::observability::{logging, metrics};
use media_relay::{Catalog, HttpServer};

/// How long open streams may keep the process alive after a shutdown signal.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

#[derive(Parser)]
#[command(name = "media-relay")]
#[command(about = "Media catalog API and streaming video relay", long_about = None)]
struct Args {
    /// Path to a TOML configuration file.
    #[arg(short, long, env = "MEDIA_RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Listen address, overriding the configuration.
    #[arg(short, long)]
    bind: Option<SocketAddr>,

    /// Listen port, overriding the configured one.
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,
}

fn resolve_config(args: &Args) -> Result<RelayConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => {
            let config = RelayConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            config
        }
    };

    if let Some(bind) = args.bind {
        config.listener.bind_address = bind.to_string();
    }
    if let Some(port) = args.port {
        // Validated above, so the address parses.
        if let Ok(mut addr) = config.listener.bind_address.parse::<SocketAddr>() {
            addr.set_port(port);
            config.listener.bind_address = addr.to_string();
        }
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init_logging(&config.observability);
    tracing::info!("media-relay v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        max_redirects = config.relay.max_redirects,
        upstream_timeout_secs = config.relay.timeout_secs,
        data_dir = %config.catalog.data_dir,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        if let Err(e) = metrics::init_metrics(addr) {
            tracing::error!(error = %e, "Failed to start metrics exporter");
        }
    }

    let catalog = Catalog::load(&config.catalog);
    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let server = HttpServer::new(config, catalog)?;
    let shutdown = Shutdown::new();
    let mut server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    tokio::select! {
        result = &mut server_task => {
            result??;
            return Ok(());
        }
        _ = wait_for_signal() => {
            tracing::info!(listeners = shutdown.receiver_count(), grace = ?SHUTDOWN_GRACE, "Draining");
            shutdown.trigger();
        }
    }

    match tokio::time::timeout(SHUTDOWN_GRACE, server_task).await {
        Ok(result) => result??,
        Err(_) => tracing::warn!(
            grace = ?SHUTDOWN_GRACE,
            "Streams still open after grace period, exiting"
        ),
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
