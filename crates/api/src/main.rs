//! HTTP API for Switchboard.
//!
//! Exposes account binding, conversation sync, message listing, sends and
//! edits, and workspace alerts as JSON endpoints.

mod config;
mod error;
mod routes;
mod state;

use std::sync::Arc;

use database::Database;
use gateway::{Gateway, HttpGateway, RetryingGateway};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        addr = %config.addr,
        gateway = %config.gateway_url,
        fallback = config.allow_workspace_fallback,
        "Starting Switchboard API"
    );

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Provider client with retries for transient failures
    let client = HttpGateway::new(config.gateway_config())?;
    let gateway: Arc<dyn Gateway> = Arc::new(RetryingGateway::new(client, config.retry_policy()));

    // Build application state
    let state = AppState::new(db, gateway, config.pipeline_config());

    // Build router
    let app = routes::router()
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    info!(addr = %config.addr, "Switchboard API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
