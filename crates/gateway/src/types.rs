//! Wire types exchanged with the messaging provider.

use serde::{Deserialize, Serialize};

/// Account details reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteAccount {
    /// Display name of the account.
    #[serde(default)]
    pub name: String,

    /// Provider kind (e.g. "WHATSAPP").
    #[serde(default)]
    pub provider: String,
}

/// A chat as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteChat {
    /// Provider chat ID.
    pub id: String,

    /// Display name.
    #[serde(default)]
    pub name: String,

    /// Chat type (e.g. "single", "group").
    #[serde(default = "default_chat_type", rename = "type")]
    pub chat_type: String,

    /// Unread counter.
    #[serde(default)]
    pub unread_count: i64,

    /// Preview of the most recent message.
    #[serde(default)]
    pub last_message_text: Option<String>,

    /// Last activity (milliseconds since epoch).
    #[serde(default)]
    pub timestamp: Option<i64>,
}

fn default_chat_type() -> String {
    "single".to_string()
}

/// Kind of message content.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    File,
    Voice,
}

impl MessageKind {
    /// Storage form ("TEXT", "FILE", "VOICE").
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Text => "TEXT",
            MessageKind::File => "FILE",
            MessageKind::Voice => "VOICE",
        }
    }
}

/// An attachment reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    /// File path or URL the provider can read.
    pub path: String,

    /// Original filename.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    /// Content type (MIME type).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mime_type: Option<String>,

    /// Size in bytes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    /// Duration in seconds (voice notes).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_secs: Option<u32>,
}

impl Attachment {
    /// Create an attachment reference for a path.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            file_name: None,
            mime_type: None,
            size: None,
            duration_secs: None,
        }
    }

    /// Set the content type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = Some(mime_type.into());
        self
    }
}

/// A message as listed by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RemoteMessage {
    /// Provider message ID.
    pub id: String,

    /// Provider ID of the sender.
    #[serde(default)]
    pub sender_id: String,

    /// Provider ID of the account the chat belongs to.
    #[serde(default)]
    pub account_id: String,

    /// Body text.
    #[serde(default)]
    pub text: Option<String>,

    /// Attachments included with the message.
    #[serde(default)]
    pub attachments: Vec<Attachment>,

    /// Message timestamp (milliseconds since epoch).
    #[serde(default)]
    pub timestamp: i64,

    /// Content kind.
    #[serde(default, rename = "type")]
    pub kind: MessageKind,
}

/// Parameters for sending a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendRequest {
    /// Provider chat ID.
    pub chat_id: String,

    /// The message text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    /// File attachments.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<Attachment>,

    /// A voice note. Never combined with `attachments`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice_attachment: Option<Attachment>,
}

impl SendRequest {
    /// Create send params for a text message.
    pub fn text(chat_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_id: chat_id.into(),
            text: Some(text.into()),
            ..Default::default()
        }
    }
}

/// Result of sending a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentMessage {
    /// Provider message ID assigned to the sent message.
    pub id: String,

    /// Provider ID of the sender (the account itself).
    #[serde(default)]
    pub sender_id: String,

    /// Provider ID of the account.
    #[serde(default)]
    pub account_id: String,

    /// Send timestamp (milliseconds since epoch).
    pub timestamp: i64,

    /// Attachments as stored by the provider.
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}
