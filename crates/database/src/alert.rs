//! Alert persistence.
//!
//! Alerts are only ever inserted here. Resolution happens in the moderation
//! workflow, and nothing in this crate deletes them.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::models::{Alert, NewAlert};
use crate::Result;

/// Insert an alert.
pub async fn insert_alert<'e>(executor: impl SqliteExecutor<'e>, alert: &NewAlert) -> Result<Alert> {
    let record = sqlx::query_as::<_, Alert>(
        r#"
        INSERT INTO alerts (workspace_id, kind, message, chat_id, source_message_id, action_label)
        VALUES (?, ?, ?, ?, ?, ?)
        RETURNING id, workspace_id, kind, message, chat_id, source_message_id, action_label,
                  resolved, created_at
        "#,
    )
    .bind(&alert.workspace_id)
    .bind(&alert.kind)
    .bind(&alert.message)
    .bind(alert.chat_id)
    .bind(&alert.source_message_id)
    .bind(&alert.action_label)
    .fetch_one(executor)
    .await?;

    Ok(record)
}

/// List a workspace's alerts, newest first.
pub async fn list_alerts(
    pool: &SqlitePool,
    workspace_id: &str,
    include_resolved: bool,
) -> Result<Vec<Alert>> {
    let rows = sqlx::query_as::<_, Alert>(
        r#"
        SELECT id, workspace_id, kind, message, chat_id, source_message_id, action_label,
               resolved, created_at
        FROM alerts
        WHERE workspace_id = ? AND (? OR resolved = 0)
        ORDER BY id DESC
        "#,
    )
    .bind(workspace_id)
    .bind(include_resolved)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count alerts raised for a source message.
pub async fn count_alerts_for_message(pool: &SqlitePool, source_message_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM alerts WHERE source_message_id = ?
        "#,
    )
    .bind(source_message_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
