//! Account binding and sync routes.

use axum::extract::{Path, State};
use axum::Json;
use database::{Account, ChatSummary};
use pipeline::{AccountSyncReport, ChatSyncReport, InboxStore};
use serde::Deserialize;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Request to bind an account to a workspace.
#[derive(Deserialize)]
pub struct BindRequest {
    pub workspace_id: String,
}

/// Bind a provider account to a workspace.
pub async fn bind(
    State(state): State<AppState>,
    Path(account): Path<String>,
    Json(req): Json<BindRequest>,
) -> Result<Json<Account>> {
    let bound = state.sync.bind_account(&account, &req.workspace_id).await?;
    Ok(Json(bound))
}

/// Sync the account's chat list and every chat's messages.
pub async fn sync(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<AccountSyncReport>> {
    let report = state.sync.sync_account(&account).await?;
    Ok(Json(report))
}

/// Sync only the account's chat list.
pub async fn sync_chats(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<ChatSyncReport>> {
    let report = state.sync.sync_chats_for_account(&account).await?;
    Ok(Json(report))
}

/// List the account's stored chats with message counts.
pub async fn chats(
    State(state): State<AppState>,
    Path(account): Path<String>,
) -> Result<Json<Vec<ChatSummary>>> {
    let stored = state
        .store
        .find_account(&account)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("unknown account: {}", account)))?;

    let chats = state.store.list_chats(stored.id).await?;
    Ok(Json(chats))
}
