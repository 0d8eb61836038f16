//! Route handlers for the HTTP API.

pub mod accounts;
pub mod chats;
pub mod health;
pub mod messages;
pub mod workspaces;

use axum::routing::{get, patch, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Workspaces
        .route("/api/workspaces", post(workspaces::create))
        .route("/api/workspaces/:workspace/alerts", get(workspaces::alerts))
        // Accounts
        .route("/api/accounts/:account/bind", post(accounts::bind))
        .route("/api/accounts/:account/sync", post(accounts::sync))
        .route("/api/accounts/:account/chats", get(accounts::chats))
        .route("/api/accounts/:account/chats/sync", post(accounts::sync_chats))
        // Chats
        .route("/api/chats/:chat/sync", post(chats::sync))
        .route(
            "/api/chats/:chat/messages",
            get(chats::messages).post(chats::send),
        )
        // Messages
        .route("/api/messages/:id", patch(messages::edit))
}
