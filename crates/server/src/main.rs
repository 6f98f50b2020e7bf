//! Hiring server - freelancer match prediction service
//!
//! Loads (or trains) the random forest artifact and serves predictions over
//! HTTP alongside health, readiness and metrics endpoints.

use anyhow::Result;
use hiring_lib::{
    health::{components, HealthRegistry},
    observability::{HiringMetrics, StructuredLogger},
    ModelHandle,
};
use hiring_server::{api, bootstrap, config::ServerConfig};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().json())
        .init();

    info!("Starting hiring-server");

    let config = ServerConfig::load()?;
    info!(
        instance = %config.instance_name,
        artifact = %config.artifact_path.display(),
        schema = %config.schema,
        fallback = config.fallback_on_unavailable,
        "Server configured"
    );

    let health_registry = HealthRegistry::new();
    health_registry.register(components::MODEL).await;
    health_registry.register(components::TRAINER).await;

    let metrics = HiringMetrics::new();
    let logger = StructuredLogger::new(&config.instance_name);

    let state = api::AppState::new(
        ModelHandle::with_source(&config.artifact_path),
        health_registry,
        metrics,
        logger.clone(),
    )
    .with_fallback(config.fallback_on_unavailable);

    bootstrap::prepare_model(&config, &state).await;

    let addr = config.bind_addr();
    logger.log_startup(SERVER_VERSION, &addr, state.handle().version().as_deref());

    api::serve(&addr, Arc::new(state)).await?;

    logger.log_shutdown("SIGINT received");
    info!("Shutting down");

    Ok(())
}
