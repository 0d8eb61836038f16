//! Storage seam for the pipeline.

use async_trait::async_trait;
use database::{
    account, alert, chat, message, workspace, Account, Alert, Chat, ChatSummary, ChatUpsert,
    Database, Message, NewAccount, NewAlert, NewMessage, Result, Workspace,
};
use tracing::debug;

/// Storage operations the pipeline depends on.
///
/// Passed to every component explicitly. Tests can substitute an
/// implementation that fails selectively.
#[async_trait]
pub trait InboxStore: Send + Sync {
    /// Look up a workspace by ID.
    async fn find_workspace(&self, id: &str) -> Result<Option<Workspace>>;

    /// The oldest workspace, if any exist.
    async fn first_workspace(&self) -> Result<Option<Workspace>>;

    /// Look up an account by provider ID.
    async fn find_account(&self, external_id: &str) -> Result<Option<Account>>;

    /// Insert an account or refresh its provider details.
    async fn upsert_account(&self, account: &NewAccount) -> Result<Account>;

    /// Look up a chat by provider ID.
    async fn find_chat(&self, external_id: &str) -> Result<Option<Chat>>;

    /// Get a chat by local ID.
    async fn get_chat(&self, id: i64) -> Result<Chat>;

    /// Get the account that owns a chat.
    async fn get_account(&self, id: i64) -> Result<Account>;

    /// Insert a chat or refresh its mutable fields.
    async fn upsert_chat(&self, chat: &ChatUpsert) -> Result<Chat>;

    /// An account's chats with message counts.
    async fn list_chats(&self, account_id: i64) -> Result<Vec<ChatSummary>>;

    /// Whether a message with this provider ID is stored.
    async fn message_exists(&self, external_id: &str) -> Result<bool>;

    /// Insert an inbound message and its alerts in one transaction.
    async fn ingest_message(&self, message: &NewMessage, alerts: &[NewAlert])
        -> Result<Message>;

    /// Insert an outbound message and update the chat preview in one transaction.
    async fn record_outbound(&self, message: &NewMessage, preview: &str) -> Result<Message>;

    /// Get a message by local ID.
    async fn get_message(&self, id: i64) -> Result<Message>;

    /// Replace a message's text.
    async fn update_message_text(&self, id: i64, text: &str) -> Result<Message>;

    /// The newest `limit` messages of a chat, in display order.
    async fn list_messages(&self, chat_id: i64, limit: i64) -> Result<Vec<Message>>;

    /// A workspace's alerts, newest first.
    async fn list_alerts(&self, workspace_id: &str, include_resolved: bool) -> Result<Vec<Alert>>;
}

/// [`InboxStore`] backed by the SQLite database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db: Database,
}

impl SqliteStore {
    /// Create a store over a connected, migrated database.
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Get the underlying database.
    pub fn database(&self) -> &Database {
        &self.db
    }
}

#[async_trait]
impl InboxStore for SqliteStore {
    async fn find_workspace(&self, id: &str) -> Result<Option<Workspace>> {
        workspace::get_workspace(self.db.pool(), id).await
    }

    async fn first_workspace(&self) -> Result<Option<Workspace>> {
        workspace::first_workspace(self.db.pool()).await
    }

    async fn find_account(&self, external_id: &str) -> Result<Option<Account>> {
        account::get_account_by_external_id(self.db.pool(), external_id).await
    }

    async fn upsert_account(&self, new_account: &NewAccount) -> Result<Account> {
        account::upsert_account(self.db.pool(), new_account).await
    }

    async fn find_chat(&self, external_id: &str) -> Result<Option<Chat>> {
        chat::get_chat_by_external_id(self.db.pool(), external_id).await
    }

    async fn get_chat(&self, id: i64) -> Result<Chat> {
        chat::get_chat(self.db.pool(), id).await
    }

    async fn get_account(&self, id: i64) -> Result<Account> {
        account::get_account(self.db.pool(), id).await
    }

    async fn upsert_chat(&self, upsert: &ChatUpsert) -> Result<Chat> {
        chat::upsert_chat(self.db.pool(), upsert).await
    }

    async fn list_chats(&self, account_id: i64) -> Result<Vec<ChatSummary>> {
        chat::list_chat_summaries(self.db.pool(), account_id).await
    }

    async fn message_exists(&self, external_id: &str) -> Result<bool> {
        message::message_exists(self.db.pool(), external_id).await
    }

    async fn ingest_message(
        &self,
        new_message: &NewMessage,
        alerts: &[NewAlert],
    ) -> Result<Message> {
        let mut tx = self.db.begin().await?;

        let stored = message::insert_message(&mut *tx, new_message).await?;
        for new_alert in alerts {
            alert::insert_alert(&mut *tx, new_alert).await?;
        }

        tx.commit().await?;

        debug!(
            message = %stored.external_id,
            alerts = alerts.len(),
            "Ingested message"
        );
        Ok(stored)
    }

    async fn record_outbound(&self, new_message: &NewMessage, preview: &str) -> Result<Message> {
        let mut tx = self.db.begin().await?;

        let stored = message::insert_message(&mut *tx, new_message).await?;
        chat::update_chat_preview(&mut *tx, stored.chat_id, preview, stored.timestamp).await?;

        tx.commit().await?;
        Ok(stored)
    }

    async fn get_message(&self, id: i64) -> Result<Message> {
        message::get_message(self.db.pool(), id).await
    }

    async fn update_message_text(&self, id: i64, text: &str) -> Result<Message> {
        message::update_message_text(self.db.pool(), id, text).await
    }

    async fn list_messages(&self, chat_id: i64, limit: i64) -> Result<Vec<Message>> {
        message::list_messages(self.db.pool(), chat_id, limit).await
    }

    async fn list_alerts(
        &self,
        workspace_id: &str,
        include_resolved: bool,
    ) -> Result<Vec<Alert>> {
        alert::list_alerts(self.db.pool(), workspace_id, include_resolved).await
    }
}
