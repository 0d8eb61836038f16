//! The gateway capability trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::GatewayError;
use crate::types::{RemoteAccount, RemoteChat, RemoteMessage, SendRequest, SentMessage};

/// The boundary to an external messaging provider.
///
/// Implementations can be swapped per provider or replaced with a mock in
/// tests. This trait is object-safe and can be used with `Arc<dyn Gateway>`.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Fetch account details for a provider account ID.
    async fn get_account(&self, external_id: &str) -> Result<RemoteAccount, GatewayError>;

    /// List the chats of an account.
    async fn list_chats(&self, account_external_id: &str) -> Result<Vec<RemoteChat>, GatewayError>;

    /// List the most recent `page_size` messages of a chat.
    async fn list_messages(
        &self,
        chat_external_id: &str,
        page_size: u32,
    ) -> Result<Vec<RemoteMessage>, GatewayError>;

    /// Send a message.
    async fn send_message(&self, request: &SendRequest) -> Result<SentMessage, GatewayError>;

    /// Replace the text of a previously sent message.
    async fn edit_message(&self, message_external_id: &str, text: &str)
        -> Result<(), GatewayError>;

    /// Get a human-readable name for this gateway implementation.
    fn name(&self) -> &str;
}

#[async_trait]
impl<T: Gateway + ?Sized> Gateway for Arc<T> {
    async fn get_account(&self, external_id: &str) -> Result<RemoteAccount, GatewayError> {
        (**self).get_account(external_id).await
    }

    async fn list_chats(&self, account_external_id: &str) -> Result<Vec<RemoteChat>, GatewayError> {
        (**self).list_chats(account_external_id).await
    }

    async fn list_messages(
        &self,
        chat_external_id: &str,
        page_size: u32,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        (**self).list_messages(chat_external_id, page_size).await
    }

    async fn send_message(&self, request: &SendRequest) -> Result<SentMessage, GatewayError> {
        (**self).send_message(request).await
    }

    async fn edit_message(
        &self,
        message_external_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        (**self).edit_message(message_external_id, text).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}
