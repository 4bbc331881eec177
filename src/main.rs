mod aggregator;
mod alerts;
mod config;
mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::aggregator::{start_background_refresh, Aggregator};
use crate::alerts::AlertsClient;
use crate::config::Config;
use crate::routes::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "hadashot_live=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load("channels.toml")?;
    info!("Loaded {} channels from configuration", config.channels.len());

    // Create aggregator
    let aggregator = Arc::new(Aggregator::new(&config));

    // Start background refresh task
    let bg_aggregator = aggregator.clone();
    let refresh_interval = Duration::from_secs(config.cache_ttl_seconds);
    tokio::spawn(async move {
        start_background_refresh(bg_aggregator, refresh_interval).await;
    });

    // Create app state
    let state = Arc::new(AppState {
        aggregator,
        alerts: AlertsClient::new(),
    });

    // Build router; the static client bundle is the fallback so /api wins
    let app = Router::new()
        .route("/api/news", get(routes::news))
        .route("/api/alerts", get(routes::alerts))
        .route("/api/alerts/history", get(routes::alerts_history))
        .route("/health", get(routes::health))
        .fallback_service(ServeDir::new("public"))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state);

    // Start server
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);
    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port)).await?;
    info!("Server starting on http://localhost:{}", port);

    axum::serve(listener, app).await?;

    Ok(())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
