//! Reconciliation of provider chats and messages into local storage.

use std::sync::Arc;

use database::{Account, ChatUpsert, NewAccount, NewMessage};
use gateway::{Gateway, RemoteMessage};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::alerts::AlertEvaluator;
use crate::config::{PipelineConfig, ProvisioningPolicy};
use crate::error::{PipelineError, Result};
use crate::store::InboxStore;
use crate::within;

/// Result of syncing an account's chat list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatSyncReport {
    /// Chats upserted.
    pub synced_count: usize,
    /// Chats seen for the first time.
    pub created: usize,
    /// Chats that already existed.
    pub updated: usize,
    /// Chats that could not be stored.
    pub failed_count: usize,
}

/// Result of syncing one page of a chat's messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MessageSyncReport {
    /// Messages newly stored.
    pub processed_count: usize,
    /// Messages already stored.
    pub skipped_count: usize,
    /// Messages that could not be stored.
    pub failed_count: usize,
    /// Alerts raised by newly stored messages.
    pub alerts_created: usize,
}

impl MessageSyncReport {
    fn absorb(&mut self, other: &MessageSyncReport) {
        self.processed_count += other.processed_count;
        self.skipped_count += other.skipped_count;
        self.failed_count += other.failed_count;
        self.alerts_created += other.alerts_created;
    }
}

/// Result of a full account sync.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AccountSyncReport {
    pub chats: ChatSyncReport,
    /// Message totals across every chat that synced.
    pub messages: MessageSyncReport,
    /// Provider IDs of chats whose message sync failed.
    pub failed_chats: Vec<String>,
}

/// Outcome of ingesting a single remote message.
#[derive(Debug)]
enum IngestResult {
    Stored { alerts: usize },
    Duplicate,
    Failed(PipelineError),
}

/// Pulls chats and messages from the provider into the store.
pub struct SyncEngine {
    gateway: Arc<dyn Gateway>,
    store: Arc<dyn InboxStore>,
    evaluator: AlertEvaluator,
    config: PipelineConfig,
}

impl SyncEngine {
    /// Create a sync engine.
    pub fn new(
        gateway: Arc<dyn Gateway>,
        store: Arc<dyn InboxStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            gateway,
            store,
            evaluator: AlertEvaluator::new(config.alert_rules.clone()),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Bind a provider account to a workspace, creating the local record.
    ///
    /// Rebinding to the same workspace refreshes the provider details. An
    /// account already bound elsewhere is left in place.
    pub async fn bind_account(
        &self,
        account_external_id: &str,
        workspace_id: &str,
    ) -> Result<Account> {
        if self.store.find_workspace(workspace_id).await?.is_none() {
            return Err(PipelineError::UnknownWorkspace(workspace_id.to_string()));
        }

        if let Some(existing) = self.store.find_account(account_external_id).await? {
            if existing.workspace_id != workspace_id {
                return Err(PipelineError::AlreadyBound {
                    account: account_external_id.to_string(),
                    workspace: existing.workspace_id,
                });
            }
        }

        let account = self.provision(account_external_id, workspace_id).await?;
        info!(
            account = %account_external_id,
            workspace = %workspace_id,
            "Bound account to workspace"
        );
        Ok(account)
    }

    /// Sync an account's chat list.
    pub async fn sync_chats_for_account(
        &self,
        account_external_id: &str,
    ) -> Result<ChatSyncReport> {
        let (report, _) = self.sync_chat_list(account_external_id).await?;
        Ok(report)
    }

    /// Sync the newest page of a chat's messages.
    pub async fn sync_messages_for_chat(
        &self,
        chat_external_id: &str,
    ) -> Result<MessageSyncReport> {
        let chat = self
            .store
            .find_chat(chat_external_id)
            .await?
            .ok_or_else(|| PipelineError::UnknownChat(chat_external_id.to_string()))?;
        let account = self.store.get_account(chat.account_id).await?;

        let page = within(
            "list_messages",
            self.config.gateway_timeout,
            self.gateway
                .list_messages(chat_external_id, self.config.message_page_size),
        )
        .await?;

        debug!(chat = %chat_external_id, fetched = page.len(), "Fetched message page");

        let mut report = MessageSyncReport::default();
        for remote in &page {
            match self.ingest(&account, chat.id, remote).await {
                IngestResult::Stored { alerts } => {
                    report.processed_count += 1;
                    report.alerts_created += alerts;
                }
                IngestResult::Duplicate => report.skipped_count += 1,
                IngestResult::Failed(e) => {
                    warn!(
                        chat = %chat_external_id,
                        message = %remote.id,
                        error = %e,
                        "Failed to ingest message"
                    );
                    report.failed_count += 1;
                }
            }
        }

        info!(
            chat = %chat_external_id,
            processed = report.processed_count,
            skipped = report.skipped_count,
            failed = report.failed_count,
            alerts = report.alerts_created,
            "Synced messages"
        );
        Ok(report)
    }

    /// Sync an account's chat list, then every listed chat's messages.
    ///
    /// A chat whose message sync fails is recorded and the rest continue.
    pub async fn sync_account(&self, account_external_id: &str) -> Result<AccountSyncReport> {
        let (chats, chat_ids) = self.sync_chat_list(account_external_id).await?;

        let mut report = AccountSyncReport {
            chats,
            ..Default::default()
        };

        for chat_id in chat_ids {
            match self.sync_messages_for_chat(&chat_id).await {
                Ok(messages) => report.messages.absorb(&messages),
                Err(e) => {
                    warn!(
                        account = %account_external_id,
                        chat = %chat_id,
                        error = %e,
                        "Chat sync failed"
                    );
                    report.failed_chats.push(chat_id);
                }
            }
        }

        info!(
            account = %account_external_id,
            chats = report.chats.synced_count,
            messages = report.messages.processed_count,
            failed_chats = report.failed_chats.len(),
            "Account sync complete"
        );
        Ok(report)
    }

    /// Upsert every chat the provider lists; returns the IDs that were stored.
    async fn sync_chat_list(
        &self,
        account_external_id: &str,
    ) -> Result<(ChatSyncReport, Vec<String>)> {
        let account = self.resolve_account(account_external_id).await?;

        let remote_chats = within(
            "list_chats",
            self.config.gateway_timeout,
            self.gateway.list_chats(account_external_id),
        )
        .await?;

        let mut report = ChatSyncReport::default();
        let mut stored = Vec::with_capacity(remote_chats.len());

        for remote in remote_chats {
            let existed = match self.store.find_chat(&remote.id).await {
                Ok(found) => found.is_some(),
                Err(e) => {
                    warn!(chat = %remote.id, error = %e, "Failed to look up chat");
                    report.failed_count += 1;
                    continue;
                }
            };

            let upsert = ChatUpsert {
                external_id: remote.id.clone(),
                account_id: account.id,
                name: remote.name,
                chat_type: remote.chat_type,
                last_message_text: remote.last_message_text,
                last_message_at: remote.timestamp,
                unread_count: remote.unread_count,
            };

            match self.store.upsert_chat(&upsert).await {
                Ok(_) => {
                    report.synced_count += 1;
                    if existed {
                        report.updated += 1;
                    } else {
                        report.created += 1;
                    }
                    stored.push(remote.id);
                }
                Err(e) => {
                    warn!(chat = %remote.id, error = %e, "Failed to store chat");
                    report.failed_count += 1;
                }
            }
        }

        info!(
            account = %account_external_id,
            synced = report.synced_count,
            created = report.created,
            updated = report.updated,
            failed = report.failed_count,
            "Synced chat list"
        );
        Ok((report, stored))
    }

    async fn ingest(
        &self,
        account: &Account,
        chat_id: i64,
        remote: &RemoteMessage,
    ) -> IngestResult {
        match self.store.message_exists(&remote.id).await {
            Ok(true) => return IngestResult::Duplicate,
            Ok(false) => {}
            Err(e) => return IngestResult::Failed(e.into()),
        }

        let attachments = if remote.attachments.is_empty() {
            None
        } else {
            match serde_json::to_string(&remote.attachments) {
                Ok(json) => Some(json),
                Err(e) => return IngestResult::Failed(e.into()),
            }
        };

        let evaluation = self.evaluator.evaluate(
            &account.workspace_id,
            chat_id,
            &remote.id,
            remote.text.as_deref(),
        );

        let new_message = NewMessage {
            external_id: remote.id.clone(),
            chat_id,
            sender_id: remote.sender_id.clone(),
            text: remote.text.clone(),
            attachments,
            timestamp: remote.timestamp,
            is_from_me: remote.sender_id == account.external_id,
            kind: remote.kind.as_str().to_string(),
            sentiment_score: Some(i64::from(evaluation.sentiment.score)),
            sentiment_label: Some(evaluation.sentiment.label.as_str().to_string()),
        };

        match self.store.ingest_message(&new_message, &evaluation.alerts).await {
            Ok(_) => IngestResult::Stored {
                alerts: evaluation.alerts.len(),
            },
            Err(e) if e.is_already_exists() => IngestResult::Duplicate,
            Err(e) => IngestResult::Failed(e.into()),
        }
    }

    /// Find the local account, provisioning it if the policy allows.
    async fn resolve_account(&self, account_external_id: &str) -> Result<Account> {
        if let Some(account) = self.store.find_account(account_external_id).await? {
            return Ok(account);
        }

        match self.config.provisioning {
            ProvisioningPolicy::RequireBinding => {
                Err(PipelineError::UnboundAccount(account_external_id.to_string()))
            }
            ProvisioningPolicy::FirstAvailableWorkspace => {
                let workspace = self
                    .store
                    .first_workspace()
                    .await?
                    .ok_or_else(|| PipelineError::NoWorkspace(account_external_id.to_string()))?;

                let account = self.provision(account_external_id, &workspace.id).await?;
                info!(
                    account = %account_external_id,
                    workspace = %workspace.id,
                    "Provisioned account into first workspace"
                );
                Ok(account)
            }
        }
    }

    async fn provision(&self, account_external_id: &str, workspace_id: &str) -> Result<Account> {
        let remote = within(
            "get_account",
            self.config.gateway_timeout,
            self.gateway.get_account(account_external_id),
        )
        .await?;

        let account = self
            .store
            .upsert_account(&NewAccount {
                external_id: account_external_id.to_string(),
                workspace_id: workspace_id.to_string(),
                provider: remote.provider,
                name: remote.name,
            })
            .await?;
        Ok(account)
    }
}
