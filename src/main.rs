//! fleet-dashboard server entry point.
//!
//! Starts the Axum HTTP server serving the dashboard pages.

use std::sync::Arc;

use anyhow::Context;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use fleet_dashboard::app_state::AppState;
use fleet_dashboard::backend::{Backend, PostgrestBackend};
use fleet_dashboard::config::{DashboardConfig, LogFormat};
use fleet_dashboard::web;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = DashboardConfig::from_env()
        .map_err(|e| anyhow::anyhow!("invalid configuration: {e}"))?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, backend = %config.backend_url, "starting fleet-dashboard");

    // Build backend and service layer
    let backend: Arc<dyn Backend> = Arc::new(
        PostgrestBackend::new(&config.backend_url, config.backend_anon_key.clone())
            .context("failed to configure backend client")?,
    );
    let app_state = AppState::new(
        backend,
        &config.switch_function,
        config.telemetry_sample_limit,
    );

    // Build router
    let app = web::build_router()
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app).await?;

    Ok(())
}
