//! Database models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A tenant that owns accounts and receives alerts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Workspace {
    /// Workspace ID (caller-supplied, e.g. a slug or UUID).
    pub id: String,
    /// Display name.
    pub name: String,
    /// Creation timestamp.
    pub created_at: String,
}

/// A local handle to one external messaging-platform identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Account {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Provider-assigned account ID. Globally unique.
    pub external_id: String,
    /// Owning workspace.
    pub workspace_id: String,
    /// Provider kind (e.g. "WHATSAPP", "TELEGRAM").
    pub provider: String,
    /// Display name reported by the provider.
    pub name: String,
    /// Connection status ("connected" or "disconnected").
    pub status: String,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Values written when an account is first seen or refreshed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccount {
    pub external_id: String,
    pub workspace_id: String,
    pub provider: String,
    pub name: String,
}

/// A conversation thread, one per provider chat ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Chat {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Provider-assigned chat ID. Globally unique.
    pub external_id: String,
    /// Owning account.
    pub account_id: i64,
    /// Display name.
    pub name: String,
    /// Provider chat type (e.g. "single", "group").
    pub chat_type: String,
    /// Preview text of the most recent message.
    pub last_message_text: Option<String>,
    /// Timestamp of the most recent activity (ms since epoch).
    pub last_message_at: Option<i64>,
    /// Unread counter as reported by the provider.
    pub unread_count: i64,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Mutable chat fields written by an upsert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatUpsert {
    pub external_id: String,
    pub account_id: i64,
    pub name: String,
    pub chat_type: String,
    pub last_message_text: Option<String>,
    pub last_message_at: Option<i64>,
    pub unread_count: i64,
}

/// A chat together with its derived message count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub chat: Chat,
    /// Number of locally stored messages.
    pub message_count: i64,
}

/// One inbound or outbound message in a chat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Message {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Provider-assigned message ID. The idempotency key for sync.
    pub external_id: String,
    /// Owning chat.
    pub chat_id: i64,
    /// Provider sender ID.
    pub sender_id: String,
    /// Body text, if any.
    pub text: Option<String>,
    /// Serialized attachment list (opaque to the database).
    pub attachments: Option<String>,
    /// Message timestamp (ms since epoch).
    pub timestamp: i64,
    /// Whether the operator sent this message.
    pub is_from_me: bool,
    /// "TEXT", "FILE" or "VOICE".
    pub kind: String,
    /// Sentiment score in 0..=100, once scored.
    pub sentiment_score: Option<i64>,
    /// "POSITIVE", "NEUTRAL" or "NEGATIVE", once scored.
    pub sentiment_label: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
}

/// Values for inserting a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub external_id: String,
    pub chat_id: i64,
    pub sender_id: String,
    pub text: Option<String>,
    pub attachments: Option<String>,
    pub timestamp: i64,
    pub is_from_me: bool,
    pub kind: String,
    pub sentiment_score: Option<i64>,
    pub sentiment_label: Option<String>,
}

/// A workspace-visible notice raised by the alert rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Alert {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Workspace the alert is shown in.
    pub workspace_id: String,
    /// "POSITIVE", "NEGATIVE" or "WARNING".
    pub kind: String,
    /// Human-readable alert text.
    pub message: String,
    /// Chat the triggering message belongs to, if known.
    pub chat_id: Option<i64>,
    /// External ID of the triggering message, if any.
    pub source_message_id: Option<String>,
    /// Suggested follow-up action.
    pub action_label: String,
    /// Whether a moderator has resolved the alert.
    pub resolved: bool,
    /// Creation timestamp.
    pub created_at: String,
}

/// Values for inserting an alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAlert {
    pub workspace_id: String,
    pub kind: String,
    pub message: String,
    pub chat_id: Option<i64>,
    pub source_message_id: Option<String>,
    pub action_label: String,
}
