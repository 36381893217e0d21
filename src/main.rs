use actix_web::{App, HttpServer};
use std::sync::Arc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod metrics;
mod storage;

use api::AppState;
use config::AppConfig;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Values from .env never override the real environment
    dotenvy::dotenv().ok();

    // Initialize structured logging with environment-based filtering
    // Default to INFO level, can be overridden with RUST_LOG env var
    // Example: RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,artisan_backoffice=debug"))
        )
        .init();

    tracing::info!("🚀 Starting artisan back-office API");

    let config = AppConfig::from_env();

    // === 1. Initialize Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!("📊 Metrics registry created with {} metrics", metrics.registry().gather().len());
    let metrics_registry = Arc::new(metrics.registry().clone());

    // === 2. Open storage (PostgreSQL or in-memory) ===
    let stores = storage::open(&config.database).await?;

    // === 3. Wire domain services ===
    let state = AppState::new(&stores, metrics);

    // === 4. Serve the API and the metrics endpoint side by side ===
    let host = config.server.host.clone();
    let port = config.server.port;
    tracing::info!("🌐 API listening on http://{}:{}", host, port);

    let api_server = HttpServer::new(move || App::new().configure(api::configure(state.clone())))
        .bind((host.as_str(), port))?
        .run();

    let metrics_server = metrics::start_metrics_server(metrics_registry, config.server.metrics_port);

    futures_util::future::try_join(api_server, metrics_server).await?;

    tracing::info!("👋 Shutdown complete");
    Ok(())
}
