//! Account persistence.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Account, NewAccount};

/// Insert an account, or refresh provider and name if the external ID is known.
///
/// The owning workspace is only written on insert; an upsert never moves an
/// existing account to another workspace.
pub async fn upsert_account(pool: &SqlitePool, account: &NewAccount) -> Result<Account> {
    let record = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (external_id, workspace_id, provider, name)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(external_id) DO UPDATE SET
            provider = excluded.provider,
            name = excluded.name,
            updated_at = datetime('now')
        RETURNING id, external_id, workspace_id, provider, name, status, created_at, updated_at
        "#,
    )
    .bind(&account.external_id)
    .bind(&account.workspace_id)
    .bind(&account.provider)
    .bind(&account.name)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Get an account by its provider-assigned ID.
pub async fn get_account_by_external_id(
    pool: &SqlitePool,
    external_id: &str,
) -> Result<Option<Account>> {
    let record = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, external_id, workspace_id, provider, name, status, created_at, updated_at
        FROM accounts
        WHERE external_id = ?
        "#,
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Get an account by ID.
pub async fn get_account(pool: &SqlitePool, id: i64) -> Result<Account> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, external_id, workspace_id, provider, name, status, created_at, updated_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Account",
        id: id.to_string(),
    })
}
