//! Xray client provisioner.
//!
//! Adds and removes VLESS clients in an xray configuration file, restarts
//! the service, and hands out share links over a small HTTP API.
//!
//! # Architecture Overview
//!
//! ```text
//!   HTTP request
//!   ───────────▶ http (axum) ──▶ provisioning ──▶ xray::store ──▶ config.json
//!                                     │                │
//!                                     │                └──▶ reload (systemctl restart xray)
//!                                     ├──▶ xray::router (pick inbound)
//!                                     ├──▶ xray::credentials (UUID, label, flow)
//!                                     └──▶ xray::link (vless:// link)
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use xray_provisioner::config::load_config;
use xray_provisioner::http::ApiServer;
use xray_provisioner::lifecycle::{signals, startup, Shutdown};
use xray_provisioner::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "xray-provisioner")]
#[command(about = "Provision xray clients and serve their connection links", long_about = None)]
struct Args {
    /// Path to the provisioner settings file.
    #[arg(short, long, default_value = "provisioner.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = load_config(&args.config)?;

    logging::init_logging(&config.observability);

    tracing::info!("xray-provisioner v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        config = %args.config.display(),
        xray_config = %config.xray.config_path,
        transport = %config.xray.transport,
        bind_address = %config.api.bind_address,
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

    let service = startup::start(&config).await?;

    let listener = TcpListener::bind(&config.api.bind_address).await?;
    let server = ApiServer::new(service, &config.api);

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        signals::wait_for_signal(&signal_shutdown).await;
    });

    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
