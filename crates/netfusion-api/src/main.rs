//! CLI entry point for the netfusion-api HTTP server.

use clap::Parser;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use netfusion_discover::config::{load_section, DiscoverConfig};
use netfusion_discover::SnmpScanner;
use netfusion_vault::{Vault, VaultConfig};

use netfusion_api::{build_router, ApiConfig, AppState};

#[derive(Parser)]
#[command(name = "netfusion-api")]
#[command(about = "HTTP API for NetFusion SNMP discovery and the endpoint vault")]
struct Cli {
    /// Listen address (otherwise api.bind from config).
    #[arg(short, long)]
    bind: Option<String>,

    /// Config file prefix (default: netfusion).
    #[arg(short, long, default_value = "netfusion")]
    config: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).json().init();

    let cli = Cli::parse();
    let api_config: ApiConfig = load_section(&cli.config, "api")?;
    let vault_config: VaultConfig = load_section(&cli.config, "vault")?;
    let discover_config = DiscoverConfig::load(&cli.config)?;

    let vault = Vault::open(&vault_config)?;
    tracing::info!(data_dir = %vault_config.data_dir, "Endpoint vault opened");

    let state = AppState::new(vault, SnmpScanner::new(discover_config));
    let shutdown = state.shutdown.clone();
    let app = build_router(state);

    let bind = cli.bind.unwrap_or(api_config.bind);
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    tracing::info!(%bind, "netfusion-api listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await?;

    tracing::info!("netfusion-api stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM, cancelling any running scans.
async fn shutdown_signal(shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("Received Ctrl+C, shutting down gracefully"),
        () = terminate => tracing::info!("Received SIGTERM, shutting down gracefully"),
    }

    shutdown.cancel();
}
