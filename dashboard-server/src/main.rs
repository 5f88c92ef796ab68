//! Farm IoT Dashboard Server
//!
//! Read-only HTTP surface over the readings written by the ingest service.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────┐  serial  ┌─────────────────┐  sqlite  ┌────────────────────┐
//! │ LoRa node │ ───────▶ │ farm-iot-ingest │ ───────▶ │ farm-iot-dashboard │
//! └───────────┘          └─────────────────┘          │  GET /             │
//!                                                     │  GET /api/latest   │
//!                                                     │  GET /health       │
//!                                                     └────────────────────┘
//! ```

mod config;
mod db;
mod models;
mod handlers;
mod error;

use axum::{
    Router,
    routing::get,
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use std::net::SocketAddr;

pub use error::{AppError, AppResult};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env();

    init_tracing(config.is_production());

    tracing::info!("Farm IoT Dashboard starting ({})...", config.environment);
    tracing::info!("Database: {}", config.database_url);

    // Initialize database pool
    let pool = db::create_pool(&config.database_url).await?;
    db::ensure_schema(&pool).await?;

    // Build application state
    let state = AppState {
        pool,
        config: config.clone(),
    };

    let app = create_router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "farm_iot_dashboard=debug,tower_http=debug".into());

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index::page))
        .route("/health", get(handlers::health::check))
        .route("/api/latest", get(handlers::readings::latest))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
