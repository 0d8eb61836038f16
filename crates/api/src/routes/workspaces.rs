//! Workspace routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::{workspace, Alert, Workspace};
use pipeline::InboxStore;
use serde::Deserialize;
use tracing::info;

use crate::error::{ApiError, Result};
use crate::state::AppState;

/// Request to create a workspace.
#[derive(Deserialize)]
pub struct CreateWorkspaceRequest {
    pub id: String,
    pub name: String,
}

/// Alert listing filters.
#[derive(Deserialize)]
pub struct AlertQuery {
    #[serde(default)]
    pub include_resolved: bool,
}

/// Create a workspace.
pub async fn create(
    State(state): State<AppState>,
    Json(req): Json<CreateWorkspaceRequest>,
) -> Result<(StatusCode, Json<Workspace>)> {
    let id = req.id.trim();
    let name = req.name.trim();
    if id.is_empty() || name.is_empty() {
        return Err(ApiError::BadRequest(
            "workspace id and name are required".to_string(),
        ));
    }

    let created = workspace::create_workspace(state.store.database().pool(), id, name).await?;
    info!(workspace = %created.id, "Created workspace");
    Ok((StatusCode::CREATED, Json(created)))
}

/// List a workspace's alerts, newest first.
pub async fn alerts(
    State(state): State<AppState>,
    Path(workspace_id): Path<String>,
    Query(query): Query<AlertQuery>,
) -> Result<Json<Vec<Alert>>> {
    if state.store.find_workspace(&workspace_id).await?.is_none() {
        return Err(ApiError::NotFound(format!(
            "unknown workspace: {}",
            workspace_id
        )));
    }

    let alerts = state
        .store
        .list_alerts(&workspace_id, query.include_resolved)
        .await?;
    Ok(Json(alerts))
}
