//! Subtracker API server binary entrypoint.

use std::sync::Arc;
use std::time::Duration;

use tower_http::cors::CorsLayer;
use tracing_subscriber::EnvFilter;

use subtracker_common::config::AppConfig;
use subtracker_common::db::{create_pool, run_migrations};
use subtracker_engine::repository::PgSubscriptionRepository;
use subtracker_engine::service::SubscriptionManager;

use subtracker_api::middleware::logging::request_logging;
use subtracker_api::routes::create_router;
use subtracker_api::server::{serve, shutdown_signal};
use subtracker_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("subtracker_api=debug,subtracker_engine=debug,tower_http=info")
        }))
        .json()
        .init();

    tracing::info!("Starting Subtracker API server...");

    // Load configuration
    let config = AppConfig::from_env()?;
    tracing::info!(config = ?config, "Configuration loaded");

    // Create database connection pool
    let pool = create_pool(&config.db).await?;

    if config.migrations.enabled {
        run_migrations(&pool, &config.migrations.dir).await?;
    } else {
        tracing::info!("Migrations disabled, skipping");
    }

    // Repository -> service -> router
    let repository = PgSubscriptionRepository::new(pool.clone());
    let service = SubscriptionManager::new(repository);
    let state = AppState::new(Arc::new(service));

    let app = create_router(state)
        .layer(request_logging())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    tracing::info!(address = %config.listen_addr, "API server listening");

    let result = serve(
        listener,
        app,
        shutdown_signal(),
        Duration::from_secs(config.shutdown_timeout_secs),
    )
    .await;

    tracing::info!("Closing database connection pool...");
    pool.close().await;

    if let Err(e) = &result {
        tracing::error!(error = %e, "HTTP server error");
    }
    result
}
