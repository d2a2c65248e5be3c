//! Application setup and initialization
//!
//! Everything main.rs needs to go from a loaded [`Config`] to a router.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;
pub mod tools;

use crate::state::AppState;
use anyhow::{Context, Result};
use std::sync::Arc;
use tubely_core::Config;
use tubely_db::PgVideoRepository;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    config
        .validate()
        .context("Configuration validation failed")?;

    crate::telemetry::init_telemetry(config.environment())
        .map_err(|e| anyhow::anyhow!("Failed to initialize telemetry: {}", e))?;

    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;
    let (storage, local_media) = storage::setup_storage(&config).await?;
    let (prober, remuxer) = tools::setup_media_tools(&config)?;

    let state = Arc::new(AppState::new(
        Arc::new(PgVideoRepository::new(pool)),
        storage,
        prober,
        remuxer,
        config.upload().clone(),
        local_media,
    ));

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
