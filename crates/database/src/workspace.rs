//! Workspace lookups.
//!
//! Workspace management belongs to the CRUD layer; the pipeline only needs to
//! create one for bootstrapping and to resolve owners for new accounts.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::Workspace;

/// Create a new workspace.
pub async fn create_workspace(pool: &SqlitePool, id: &str, name: &str) -> Result<Workspace> {
    sqlx::query_as::<_, Workspace>(
        r#"
        INSERT INTO workspaces (id, name)
        VALUES (?, ?)
        RETURNING id, name, created_at
        "#,
    )
    .bind(id)
    .bind(name)
    .fetch_one(pool)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Workspace", id))
}

/// Get a workspace by ID.
pub async fn get_workspace(pool: &SqlitePool, id: &str) -> Result<Option<Workspace>> {
    let workspace = sqlx::query_as::<_, Workspace>(
        r#"
        SELECT id, name, created_at
        FROM workspaces
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(workspace)
}

/// Get the oldest workspace, if any exist.
pub async fn first_workspace(pool: &SqlitePool) -> Result<Option<Workspace>> {
    let workspace = sqlx::query_as::<_, Workspace>(
        r#"
        SELECT id, name, created_at
        FROM workspaces
        ORDER BY created_at, id
        LIMIT 1
        "#,
    )
    .fetch_optional(pool)
    .await?;

    Ok(workspace)
}
