//! services/api/src/bin/api.rs

use api_lib::{
    adapters::ThreadRngSource,
    config::Config,
    error::ApiError,
    web::{state::AppState, ws_handler},
};
use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::get,
    Router,
};
use finance_assistant_core::Taxonomy;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ApiError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!("Configuration loaded. Starting server...");

    // --- 2. Build the Shared AppState ---
    let app_state = Arc::new(AppState {
        config: config.clone(),
        taxonomy: Arc::new(Taxonomy::finance()),
        random: Arc::new(ThreadRngSource),
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers([CONTENT_TYPE]);

    // --- 3. Create the Web Router ---
    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(cors)
        .with_state(app_state);

    // --- 4. Start the Server ---
    info!("Starting server on {}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
