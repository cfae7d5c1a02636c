use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use foundry_match::host::HostClient;
use foundry_match::upload::HttpBlobStore;
use foundry_match::{app, store, AppConfig, AppState};

#[derive(Debug, Parser)]
#[command(name = "foundry-match", version, about = "Founder/investor matching service")]
struct Args {
    /// Address to bind
    #[arg(long, env = "BIND_HOST", default_value = "0.0.0.0")]
    host: String,

    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// Apply embedded database migrations before serving
    #[arg(long)]
    migrate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so local runs pick up HOST_API_KEY, DATABASE_URL, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("foundry_match=info,tower_http=info")),
        )
        .init();

    let args = Args::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;
    tracing::info!("Starting Foundry Match in {:?} mode", config.environment);

    let host = HostClient::new(&config).context("failed to build host platform client")?;
    let blobs = HttpBlobStore::new(&config.blob).context("failed to build blob store client")?;
    let profiles = store::connect(&config.database, args.migrate)
        .await
        .context("failed to open profile store")?;

    let state = AppState::new(config, Arc::new(host), profiles, Arc::new(blobs));

    let bind_addr = format!("{}:{}", args.host, args.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    tracing::info!("Listening on http://{}", bind_addr);

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
