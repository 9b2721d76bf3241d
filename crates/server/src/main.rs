//! syncvault server binary.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::path::PathBuf;
use syncvault_server::bootstrap::{load_config, load_registry};
use syncvault_server::{AppState, create_router};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// syncvault - blob sync gateway
#[derive(Parser, Debug)]
#[command(name = "syncvaultd")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(
        short,
        long,
        env = "SYNCVAULT_CONFIG",
        default_value = "config/server.toml"
    )]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("syncvault v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    let registry = load_registry(&config.auth)?;

    if config.server.metrics_enabled {
        syncvault_server::metrics::register_metrics();
        tracing::info!("Prometheus metrics registered");
    }

    let storage = syncvault_storage::from_config(&config.storage)
        .await
        .context("failed to initialize storage")?;

    // Fail fast instead of reporting healthy on an unusable storage root.
    storage
        .health_check()
        .await
        .context("storage health check failed")?;
    tracing::info!(backend = storage.backend_name(), "Storage backend ready");

    let addr: SocketAddr = config.server.bind.parse().context("invalid bind address")?;
    let state = AppState::new(config, storage, registry);
    let app = create_router(state);

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind to {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}
