//! Delivery state of a message the operator is sending.

use std::fmt;

use database::Message;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::outbound::OutboundDraft;

/// Where a pending message is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Composing,
    Sending,
    Sent,
    Delivered,
    Failed,
}

impl DeliveryStatus {
    /// Whether `self -> next` is a legal move.
    pub fn can_transition_to(self, next: DeliveryStatus) -> bool {
        use DeliveryStatus::*;
        matches!(
            (self, next),
            (Composing, Sending)
                | (Sending, Sent)
                | (Sending, Failed)
                | (Sent, Delivered)
                | (Failed, Sending)
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::Composing => "composing",
            DeliveryStatus::Sending => "sending",
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An illegal status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("cannot move message from {from} to {to}")]
pub struct TransitionError {
    pub from: DeliveryStatus,
    pub to: DeliveryStatus,
}

/// A message the operator composed, tracked until the provider has it.
///
/// The draft is never replaced: a failed send keeps it so the operator can
/// retry without retyping.
#[derive(Debug, Clone)]
pub struct PendingMessage {
    /// Client-side identifier, stable across retries.
    pub local_id: Uuid,
    /// Local chat ID.
    pub chat_id: i64,
    draft: OutboundDraft,
    status: DeliveryStatus,
    message: Option<Message>,
    external_id: Option<String>,
    error: Option<String>,
}

impl PendingMessage {
    /// Start composing a message for a chat.
    pub fn new(chat_id: i64, draft: OutboundDraft) -> Self {
        Self {
            local_id: Uuid::new_v4(),
            chat_id,
            draft,
            status: DeliveryStatus::Composing,
            message: None,
            external_id: None,
            error: None,
        }
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    pub fn draft(&self) -> &OutboundDraft {
        &self.draft
    }

    /// The stored message, once sent.
    pub fn message(&self) -> Option<&Message> {
        self.message.as_ref()
    }

    /// Provider ID of the sent message.
    pub fn external_id(&self) -> Option<&str> {
        self.external_id.as_deref()
    }

    /// The error of the last failed attempt.
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Begin a send attempt (first try or retry after a failure).
    pub fn start_sending(&mut self) -> Result<(), TransitionError> {
        self.transition(DeliveryStatus::Sending)?;
        self.error = None;
        Ok(())
    }

    /// Record the stored message returned by a successful send.
    pub fn mark_sent(&mut self, message: Message) -> Result<(), TransitionError> {
        self.transition(DeliveryStatus::Sent)?;
        self.external_id = Some(message.external_id.clone());
        self.message = Some(message);
        Ok(())
    }

    /// Record a send the provider accepted but that has no local row yet.
    ///
    /// The entry is sent, so it can no longer be retried; the row arrives with
    /// the next message sync.
    pub fn mark_sent_unrecorded(
        &mut self,
        external_id: impl Into<String>,
        error: impl Into<String>,
    ) -> Result<(), TransitionError> {
        self.transition(DeliveryStatus::Sent)?;
        self.external_id = Some(external_id.into());
        self.error = Some(error.into());
        Ok(())
    }

    /// Record a failed send attempt.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), TransitionError> {
        self.transition(DeliveryStatus::Failed)?;
        self.error = Some(error.into());
        Ok(())
    }

    /// Record the provider's delivery acknowledgement.
    pub fn mark_delivered(&mut self) -> Result<(), TransitionError> {
        self.transition(DeliveryStatus::Delivered)
    }

    fn transition(&mut self, to: DeliveryStatus) -> Result<(), TransitionError> {
        if !self.status.can_transition_to(to) {
            return Err(TransitionError {
                from: self.status,
                to,
            });
        }
        self.status = to;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored_message() -> Message {
        Message {
            id: 1,
            external_id: "sent-1".to_string(),
            chat_id: 1,
            sender_id: "acct".to_string(),
            text: Some("hello".to_string()),
            attachments: None,
            timestamp: 1_000,
            is_from_me: true,
            kind: "TEXT".to_string(),
            sentiment_score: Some(50),
            sentiment_label: Some("NEUTRAL".to_string()),
            created_at: "2026-01-01 00:00:00".to_string(),
        }
    }

    #[test]
    fn test_happy_path() {
        let mut pending = PendingMessage::new(1, OutboundDraft::text("hello"));
        assert_eq!(pending.status(), DeliveryStatus::Composing);

        pending.start_sending().unwrap();
        pending.mark_sent(stored_message()).unwrap();
        assert_eq!(pending.message().map(|m| m.id), Some(1));

        pending.mark_delivered().unwrap();
        assert_eq!(pending.status(), DeliveryStatus::Delivered);
    }

    #[test]
    fn test_failure_keeps_draft_and_allows_retry() {
        let mut pending = PendingMessage::new(1, OutboundDraft::text("hello"));
        let local_id = pending.local_id;

        pending.start_sending().unwrap();
        pending.mark_failed("provider unreachable").unwrap();
        assert_eq!(pending.status(), DeliveryStatus::Failed);
        assert_eq!(pending.error(), Some("provider unreachable"));
        assert_eq!(pending.draft(), &OutboundDraft::text("hello"));
        assert!(pending.message().is_none());

        pending.start_sending().unwrap();
        assert!(pending.error().is_none());
        assert_eq!(pending.local_id, local_id);
    }

    #[test]
    fn test_sent_without_row_cannot_be_retried() {
        let mut pending = PendingMessage::new(1, OutboundDraft::text("hello"));
        pending.start_sending().unwrap();
        pending
            .mark_sent_unrecorded("sent-1", "storage unavailable")
            .unwrap();

        assert_eq!(pending.status(), DeliveryStatus::Sent);
        assert_eq!(pending.external_id(), Some("sent-1"));
        assert!(pending.message().is_none());
        assert_eq!(
            pending.start_sending(),
            Err(TransitionError {
                from: DeliveryStatus::Sent,
                to: DeliveryStatus::Sending,
            })
        );
    }

    #[test]
    fn test_illegal_transitions() {
        let mut pending = PendingMessage::new(1, OutboundDraft::text("hello"));
        assert_eq!(
            pending.mark_sent(stored_message()),
            Err(TransitionError {
                from: DeliveryStatus::Composing,
                to: DeliveryStatus::Sent
            })
        );
        assert!(pending.mark_delivered().is_err());
        assert!(pending.mark_failed("x").is_err());

        pending.start_sending().unwrap();
        assert!(pending.start_sending().is_err());
        pending.mark_sent(stored_message()).unwrap();
        assert!(pending.mark_failed("late").is_err());
        assert!(pending.start_sending().is_err());
        assert_eq!(pending.status(), DeliveryStatus::Sent);
    }

    #[test]
    fn test_transition_table() {
        use DeliveryStatus::*;
        let all = [Composing, Sending, Sent, Delivered, Failed];
        let legal = all
            .iter()
            .flat_map(|from| all.iter().map(move |to| (*from, *to)))
            .filter(|(from, to)| from.can_transition_to(*to))
            .count();
        assert_eq!(legal, 5);
        assert!(!Delivered.can_transition_to(Failed));
    }
}
