use anyhow::{Context, Result};
use folio_server::{AppState, ServerConfig, app};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,folio_core=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    let state = AppState::from_config(&config).context("Failed to configure extractor")?;

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await.context("Failed to bind to address")?;
    tracing::info!(addr = %config.bind_addr, fetch_timeout = config.fetch.timeout, "folio server listening");

    axum::serve(listener, app(state)).with_graceful_shutdown(shutdown_signal()).await.context("Server error")?;

    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_ok() {
        tracing::info!("shutting down");
    }
}
