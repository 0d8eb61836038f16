//! Chat persistence.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Chat, ChatSummary, ChatUpsert};

/// Insert a chat, or update its mutable fields if the external ID is known.
///
/// Name, chat type and unread count are always overwritten. Preview text and
/// last activity keep their stored values when the provider reports none.
pub async fn upsert_chat(pool: &SqlitePool, chat: &ChatUpsert) -> Result<Chat> {
    let record = sqlx::query_as::<_, Chat>(
        r#"
        INSERT INTO chats (external_id, account_id, name, chat_type, last_message_text, last_message_at, unread_count)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(external_id) DO UPDATE SET
            name = excluded.name,
            chat_type = excluded.chat_type,
            last_message_text = COALESCE(excluded.last_message_text, last_message_text),
            last_message_at = COALESCE(excluded.last_message_at, last_message_at),
            unread_count = excluded.unread_count,
            updated_at = datetime('now')
        RETURNING id, external_id, account_id, name, chat_type, last_message_text,
                  last_message_at, unread_count, created_at, updated_at
        "#,
    )
    .bind(&chat.external_id)
    .bind(chat.account_id)
    .bind(&chat.name)
    .bind(&chat.chat_type)
    .bind(&chat.last_message_text)
    .bind(chat.last_message_at)
    .bind(chat.unread_count)
    .fetch_one(pool)
    .await?;

    Ok(record)
}

/// Get a chat by its provider-assigned ID.
pub async fn get_chat_by_external_id(pool: &SqlitePool, external_id: &str) -> Result<Option<Chat>> {
    let record = sqlx::query_as::<_, Chat>(
        r#"
        SELECT id, external_id, account_id, name, chat_type, last_message_text,
               last_message_at, unread_count, created_at, updated_at
        FROM chats
        WHERE external_id = ?
        "#,
    )
    .bind(external_id)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Get a chat by ID.
pub async fn get_chat(pool: &SqlitePool, id: i64) -> Result<Chat> {
    sqlx::query_as::<_, Chat>(
        r#"
        SELECT id, external_id, account_id, name, chat_type, last_message_text,
               last_message_at, unread_count, created_at, updated_at
        FROM chats
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Chat",
        id: id.to_string(),
    })
}

/// List an account's chats, most recently active first, with message counts.
pub async fn list_chat_summaries(pool: &SqlitePool, account_id: i64) -> Result<Vec<ChatSummary>> {
    let rows = sqlx::query_as::<_, ChatSummary>(
        r#"
        SELECT c.id, c.external_id, c.account_id, c.name, c.chat_type, c.last_message_text,
               c.last_message_at, c.unread_count, c.created_at, c.updated_at,
               (SELECT COUNT(*) FROM messages m WHERE m.chat_id = c.id) AS message_count
        FROM chats c
        WHERE c.account_id = ?
        ORDER BY c.last_message_at IS NULL, c.last_message_at DESC, c.id
        "#,
    )
    .bind(account_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Point-update a chat's preview text and last activity.
pub async fn update_chat_preview<'e>(
    executor: impl SqliteExecutor<'e>,
    chat_id: i64,
    text: &str,
    at: i64,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE chats
        SET last_message_text = ?, last_message_at = ?, updated_at = datetime('now')
        WHERE id = ?
        "#,
    )
    .bind(text)
    .bind(at)
    .bind(chat_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Chat",
            id: chat_id.to_string(),
        });
    }

    Ok(())
}
