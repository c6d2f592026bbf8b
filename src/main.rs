//! SSE gateway entry point.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use sse_gateway::config::{load_config, watcher::ConfigWatcher, GatewayConfig};
use sse_gateway::lifecycle::{signals::trigger_on_signal, Shutdown};
use sse_gateway::observability::init_logging;
use sse_gateway::HttpServer;

#[derive(Parser)]
#[command(name = "sse-gateway")]
#[command(about = "Gateway relaying Server-Sent-Events streams from backends", long_about = None)]
struct Cli {
    /// Path to the TOML configuration file. Defaults apply when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::default(),
    };

    init_logging(&config.observability)?;

    tracing::info!("sse-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        endpoints = config.endpoints.len(),
        fallback = config.fallback.is_some(),
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server = HttpServer::new(config, shutdown.subscribe());

    // Kept alive for the lifetime of the process.
    let _watcher = match &cli.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            server.spawn_reload(updates);
            match watcher.run() {
                Ok(watcher) => Some(watcher),
                Err(e) => {
                    tracing::warn!(error = %e, "Config watcher unavailable, hot reload disabled");
                    None
                }
            }
        }
        None => None,
    };

    tokio::spawn(trigger_on_signal(shutdown));

    server.run(listener).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
