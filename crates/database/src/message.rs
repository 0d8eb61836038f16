//! Message persistence.
//!
//! Messages are insert-only history. The only mutation is an explicit text
//! edit; sentiment fields are written once at insert time.

use sqlx::{SqliteExecutor, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{Message, NewMessage};

/// Check whether a message with this external ID is already stored.
pub async fn message_exists(pool: &SqlitePool, external_id: &str) -> Result<bool> {
    let exists = sqlx::query_scalar::<_, bool>(
        r#"
        SELECT EXISTS(SELECT 1 FROM messages WHERE external_id = ?)
        "#,
    )
    .bind(external_id)
    .fetch_one(pool)
    .await?;

    Ok(exists)
}

/// Insert a message.
///
/// Returns [`DatabaseError::AlreadyExists`] if the external ID is taken.
pub async fn insert_message<'e>(
    executor: impl SqliteExecutor<'e>,
    message: &NewMessage,
) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        INSERT INTO messages
            (external_id, chat_id, sender_id, text, attachments, timestamp, is_from_me, kind,
             sentiment_score, sentiment_label)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, external_id, chat_id, sender_id, text, attachments, timestamp, is_from_me,
                  kind, sentiment_score, sentiment_label, created_at
        "#,
    )
    .bind(&message.external_id)
    .bind(message.chat_id)
    .bind(&message.sender_id)
    .bind(&message.text)
    .bind(&message.attachments)
    .bind(message.timestamp)
    .bind(message.is_from_me)
    .bind(&message.kind)
    .bind(message.sentiment_score)
    .bind(&message.sentiment_label)
    .fetch_one(executor)
    .await
    .map_err(|e| DatabaseError::from_insert(e, "Message", &message.external_id))
}

/// Get a message by ID.
pub async fn get_message(pool: &SqlitePool, id: i64) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        SELECT id, external_id, chat_id, sender_id, text, attachments, timestamp, is_from_me,
               kind, sentiment_score, sentiment_label, created_at
        FROM messages
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Message",
        id: id.to_string(),
    })
}

/// Replace a message's text. Nothing else on the row changes.
pub async fn update_message_text(pool: &SqlitePool, id: i64, text: &str) -> Result<Message> {
    sqlx::query_as::<_, Message>(
        r#"
        UPDATE messages
        SET text = ?
        WHERE id = ?
        RETURNING id, external_id, chat_id, sender_id, text, attachments, timestamp, is_from_me,
                  kind, sentiment_score, sentiment_label, created_at
        "#,
    )
    .bind(text)
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Message",
        id: id.to_string(),
    })
}

/// List the newest `limit` messages of a chat in display order (oldest first).
pub async fn list_messages(pool: &SqlitePool, chat_id: i64, limit: i64) -> Result<Vec<Message>> {
    let rows = sqlx::query_as::<_, Message>(
        r#"
        SELECT id, external_id, chat_id, sender_id, text, attachments, timestamp, is_from_me,
               kind, sentiment_score, sentiment_label, created_at
        FROM (
            SELECT *
            FROM messages
            WHERE chat_id = ?
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
        )
        ORDER BY timestamp ASC, id ASC
        "#,
    )
    .bind(chat_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Count messages stored for a chat.
pub async fn count_messages(pool: &SqlitePool, chat_id: i64) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM messages WHERE chat_id = ?
        "#,
    )
    .bind(chat_id)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
