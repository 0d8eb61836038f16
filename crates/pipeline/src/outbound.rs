//! Outbound sends and edits.

use std::sync::Arc;

use database::{Chat, DatabaseError, Message, NewMessage};
use gateway::{Attachment, Gateway, MessageKind, SendRequest, SentMessage};
use sentiment::score;
use tracing::{error, info};

use crate::config::PipelineConfig;
use crate::delivery::PendingMessage;
use crate::error::{PipelineError, Result};
use crate::store::InboxStore;
use crate::validation::{validate_draft, validate_text};
use crate::within;

/// Chat preview for a file send without text.
pub const FILE_PREVIEW: &str = "[attachment]";

/// Chat preview for a voice note without text.
pub const VOICE_PREVIEW: &str = "[voice note]";

/// Attachments carried by an outbound message.
///
/// Files and a voice note are mutually exclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum OutboundAttachments {
    #[default]
    None,
    Files(Vec<Attachment>),
    Voice(Attachment),
}

/// Content composed by an operator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundDraft {
    pub text: Option<String>,
    pub attachments: OutboundAttachments,
}

impl OutboundDraft {
    /// A text-only draft.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            attachments: OutboundAttachments::None,
        }
    }

    /// A draft carrying files.
    pub fn files(files: Vec<Attachment>) -> Self {
        Self {
            text: None,
            attachments: OutboundAttachments::Files(files),
        }
    }

    /// A draft carrying a voice note.
    pub fn voice(voice: Attachment) -> Self {
        Self {
            text: None,
            attachments: OutboundAttachments::Voice(voice),
        }
    }

    /// Add caption text.
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    fn kind(&self) -> MessageKind {
        match self.attachments {
            OutboundAttachments::None => MessageKind::Text,
            OutboundAttachments::Files(_) => MessageKind::File,
            OutboundAttachments::Voice(_) => MessageKind::Voice,
        }
    }

    /// Text with surrounding whitespace removed, if any is left.
    fn body(&self) -> Option<&str> {
        self.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }

    fn preview(&self) -> String {
        match (self.body(), &self.attachments) {
            (Some(text), _) => text.to_string(),
            (None, OutboundAttachments::Voice(_)) => VOICE_PREVIEW.to_string(),
            (None, _) => FILE_PREVIEW.to_string(),
        }
    }

    fn to_request(&self, chat_external_id: &str) -> SendRequest {
        let (attachments, voice_attachment) = match &self.attachments {
            OutboundAttachments::None => (Vec::new(), None),
            OutboundAttachments::Files(files) => (files.clone(), None),
            OutboundAttachments::Voice(voice) => (Vec::new(), Some(voice.clone())),
        };
        SendRequest {
            chat_id: chat_external_id.to_string(),
            text: self.body().map(str::to_string),
            attachments,
            voice_attachment,
        }
    }
}

/// Sends and edits operator messages through the provider.
pub struct OutboundCoordinator {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn InboxStore>,
    config: PipelineConfig,
}

impl OutboundCoordinator {
    /// Create a coordinator.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn InboxStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            config,
        }
    }

    /// Send a draft to a chat and store the result.
    ///
    /// Nothing is stored unless the provider accepted the message. If storing
    /// an accepted message fails the error is [`PipelineError::Unrecorded`].
    pub async fn send(&self, chat_id: i64, draft: &OutboundDraft) -> Result<Message> {
        validate_draft(draft)?;

        let chat = match self.store.get_chat(chat_id).await {
            Ok(chat) => chat,
            Err(DatabaseError::NotFound { .. }) => {
                return Err(PipelineError::UnknownChat(chat_id.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        let request = draft.to_request(&chat.external_id);
        let sent = within(
            "send_message",
            self.config.gateway_timeout,
            self.gateway.send_message(&request),
        )
        .await
        .inspect_err(|e| error!(chat = %chat.external_id, error = %e, "Send failed"))?;

        let external_id = sent.id.clone();
        let stored = self
            .record(&chat, &request, draft, sent)
            .await
            .map_err(|e| {
                error!(
                    chat = %chat.external_id,
                    message = %external_id,
                    error = %e,
                    "Provider accepted message but storing it failed"
                );
                PipelineError::Unrecorded {
                    external_id: external_id.clone(),
                    reason: e.to_string(),
                }
            })?;

        info!(
            chat = %chat.external_id,
            message = %stored.external_id,
            kind = %stored.kind,
            "Sent message"
        );
        Ok(stored)
    }

    /// Store a message the provider accepted and update the chat preview.
    async fn record(
        &self,
        chat: &Chat,
        request: &SendRequest,
        draft: &OutboundDraft,
        sent: SentMessage,
    ) -> Result<Message> {
        let sender_id = if sent.sender_id.is_empty() {
            self.store.get_account(chat.account_id).await?.external_id
        } else {
            sent.sender_id
        };

        let attachments = if !sent.attachments.is_empty() {
            Some(serde_json::to_string(&sent.attachments)?)
        } else if !request.attachments.is_empty() {
            Some(serde_json::to_string(&request.attachments)?)
        } else if let Some(voice) = &request.voice_attachment {
            Some(serde_json::to_string(std::slice::from_ref(voice))?)
        } else {
            None
        };

        let sentiment = score(draft.body());
        let new_message = NewMessage {
            external_id: sent.id,
            chat_id: chat.id,
            sender_id,
            text: request.text.clone(),
            attachments,
            timestamp: sent.timestamp,
            is_from_me: true,
            kind: draft.kind().as_str().to_string(),
            sentiment_score: Some(i64::from(sentiment.score)),
            sentiment_label: Some(sentiment.label.as_str().to_string()),
        };

        Ok(self
            .store
            .record_outbound(&new_message, &draft.preview())
            .await?)
    }

    /// Replace the text of a sent message, at the provider and locally.
    ///
    /// Sentiment and alerts are left as they were.
    pub async fn edit(&self, message_id: i64, text: &str) -> Result<Message> {
        validate_text(text)?;

        let message = match self.store.get_message(message_id).await {
            Ok(message) => message,
            Err(DatabaseError::NotFound { .. }) => {
                return Err(PipelineError::UnknownMessage(message_id))
            }
            Err(e) => return Err(e.into()),
        };

        within(
            "edit_message",
            self.config.gateway_timeout,
            self.gateway.edit_message(&message.external_id, text),
        )
        .await?;

        let updated = self.store.update_message_text(message_id, text).await?;
        info!(message = %updated.external_id, "Edited message");
        Ok(updated)
    }

    /// Drive a pending message through a send attempt.
    ///
    /// An invalid draft is rejected while still composing. On success the
    /// entry holds the stored message. If the provider rejects the send the
    /// entry keeps its draft and records the error, ready for a manual retry.
    /// If the provider accepted it but storing failed, the entry is sent
    /// without a local row and cannot be retried.
    pub async fn dispatch(&self, pending: &mut PendingMessage) -> Result<()> {
        validate_draft(pending.draft())?;
        pending.start_sending()?;

        match self.send(pending.chat_id, pending.draft()).await {
            Ok(message) => {
                pending.mark_sent(message)?;
                Ok(())
            }
            Err(e) => {
                match &e {
                    PipelineError::Unrecorded {
                        external_id,
                        reason,
                    } => pending.mark_sent_unrecorded(external_id.as_str(), reason.as_str())?,
                    _ => pending.mark_failed(e.to_string())?,
                }
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_trims_text_and_splits_attachments() {
        let draft = OutboundDraft::voice(Attachment::new("/tmp/note.ogg")).with_text("  ");
        let request = draft.to_request("c1");
        assert_eq!(request.chat_id, "c1");
        assert!(request.text.is_none());
        assert!(request.attachments.is_empty());
        assert_eq!(request.voice_attachment, Some(Attachment::new("/tmp/note.ogg")));
    }

    #[test]
    fn test_preview_and_kind() {
        let text = OutboundDraft::text("See you soon");
        assert_eq!(text.preview(), "See you soon");
        assert_eq!(text.kind(), MessageKind::Text);

        let files = OutboundDraft::files(vec![Attachment::new("/tmp/a.pdf")]);
        assert_eq!(files.preview(), FILE_PREVIEW);
        assert_eq!(files.kind(), MessageKind::File);

        let voice = OutboundDraft::voice(Attachment::new("/tmp/v.ogg"));
        assert_eq!(voice.preview(), VOICE_PREVIEW);
        assert_eq!(voice.kind(), MessageKind::Voice);

        let captioned =
            OutboundDraft::files(vec![Attachment::new("/tmp/a.pdf")]).with_text("Invoice");
        assert_eq!(captioned.preview(), "Invoice");
    }
}
