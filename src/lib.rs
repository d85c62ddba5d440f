use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;

use crate::app::create_app;
use crate::config::Settings;
use crate::devices::tapo::TapoDriver;
use crate::models::AppState;
use crate::registry::Registry;

pub mod app;
pub mod color;
pub mod commands;
pub mod config;
pub mod devices;
pub mod dispatch;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod registry;
pub mod utils;

/// Connect to the configured devices, serve until a shutdown signal, then close sessions.
pub async fn run(settings: Settings) -> anyhow::Result<()> {
    if settings.metrics.enabled {
        crate::metrics::setup_metrics(settings.metrics.port)?;
    }

    let driver = TapoDriver::new(&settings.credentials.username, &settings.credentials.password);
    let registry = Registry::initialize(&driver, &settings.devices).await;
    info!(
        "{} of {} devices connected",
        registry.connected_count(),
        registry.len()
    );

    let state = Arc::new(AppState::new(registry, settings.dispatch.clone()));
    let app = create_app(state.clone());

    let listener = TcpListener::bind(&settings.server.address)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind address: {}", e))?;

    info!("Server started on {}", settings.server.address);

    axum::serve(listener, app)
        .with_graceful_shutdown(utils::shutdown_signal())
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    state.registry.shutdown().await;
    Ok(())
}
