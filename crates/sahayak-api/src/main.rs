//! # sahayak-api — Binary Entry Point
//!
//! Reads configuration from the environment, loads the station dataset,
//! installs the Prometheus recorder and serves the receiver API.

use anyhow::Context;
use metrics_exporter_prometheus::PrometheusBuilder;
use sahayak_api::state::{AppConfig, AppState, LogFormat};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }

    let metrics = PrometheusBuilder::new()
        .install_recorder()
        .context("failed to install Prometheus recorder")?;

    let state = AppState::from_config(&config)
        .context("failed to initialise alert console")?
        .with_metrics(metrics);
    tracing::info!(
        stations = state.console.registry().len(),
        radius_km = config.radius_km,
        "alert console ready"
    );

    let app = sahayak_api::app(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, "Sahayak API listening");
    axum::serve(listener, app).await?;

    Ok(())
}
