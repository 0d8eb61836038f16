//! Sync engine scenarios against an in-memory database and a mock provider.

mod common;

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common::*;
use database::{
    account, alert, chat, Account, Alert, Chat, ChatSummary, ChatUpsert, DatabaseError, Message,
    NewAccount, NewAlert, NewMessage, Workspace,
};
use gateway::{
    Gateway, GatewayError, MockGateway, RemoteAccount, RemoteChat, RemoteMessage, RetryPolicy,
    RetryingGateway, SendRequest, SentMessage,
};
use pipeline::{
    InboxStore, PipelineConfig, PipelineError, ProvisioningPolicy, SqliteStore, SyncEngine,
};

#[tokio::test]
async fn test_sync_scores_stores_and_alerts() {
    let h = synced_harness().await;
    h.gateway.push_message("c1", inbound("m1", "Hi, when do you open?", 1_000));
    h.gateway.push_message(
        "c1",
        inbound("m2", "Another delay? This is unacceptable", 2_000),
    );
    h.gateway.push_message("c1", inbound("m3", "Ok, see you tomorrow", 3_000));

    let report = h.engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(report.processed_count, 3);
    assert_eq!(report.skipped_count, 0);
    assert_eq!(report.failed_count, 0);
    assert_eq!(report.alerts_created, 2);

    let chat = h.store.find_chat("c1").await.unwrap().unwrap();
    let messages = h.store.list_messages(chat.id, 50).await.unwrap();
    let ids: Vec<_> = messages.iter().map(|m| m.external_id.as_str()).collect();
    assert_eq!(ids, ["m1", "m2", "m3"]);
    assert!(messages.iter().all(|m| !m.is_from_me));

    let negative = &messages[1];
    assert_eq!(negative.sentiment_score, Some(30));
    assert_eq!(negative.sentiment_label.as_deref(), Some("NEGATIVE"));
    assert_eq!(messages[0].sentiment_score, Some(50));

    let alerts = h.store.list_alerts(WORKSPACE, false).await.unwrap();
    let mut kinds: Vec<_> = alerts.iter().map(|a| a.kind.as_str()).collect();
    kinds.sort();
    assert_eq!(kinds, ["NEGATIVE", "WARNING"]);
    for a in &alerts {
        assert_eq!(a.source_message_id.as_deref(), Some("m2"));
        assert_eq!(a.chat_id, Some(chat.id));
    }
}

#[tokio::test]
async fn test_resync_is_idempotent() {
    let h = synced_harness().await;
    h.gateway.push_message("c1", inbound("m1", "This is terrible", 1_000));
    h.gateway.push_message("c1", inbound("m2", "Thanks anyway", 2_000));

    let first = h.engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(first.processed_count, 2);
    assert_eq!(first.alerts_created, 1);

    let second = h.engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(second.processed_count, 0);
    assert_eq!(second.skipped_count, 2);
    assert_eq!(second.alerts_created, 0);

    let chat = h.store.find_chat("c1").await.unwrap().unwrap();
    assert_eq!(h.store.list_messages(chat.id, 50).await.unwrap().len(), 2);
    assert_eq!(h.store.list_alerts(WORKSPACE, true).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_chat_sync_creates_then_updates() {
    let h = harness().await;
    h.engine.bind_account(ACCOUNT, WORKSPACE).await.unwrap();

    let first = h.engine.sync_chats_for_account(ACCOUNT).await.unwrap();
    assert_eq!((first.synced_count, first.created, first.updated), (1, 1, 0));

    let mut renamed = remote_chat("c1");
    renamed.name = "Jane Doe".to_string();
    renamed.unread_count = 4;
    h.gateway.add_chat(ACCOUNT, renamed);
    h.gateway.add_chat(ACCOUNT, remote_chat("c2"));

    let second = h.engine.sync_chats_for_account(ACCOUNT).await.unwrap();
    assert_eq!((second.synced_count, second.created, second.updated), (2, 1, 1));

    let account = h.store.find_account(ACCOUNT).await.unwrap().unwrap();
    let chats = h.store.list_chats(account.id).await.unwrap();
    assert_eq!(chats.len(), 2);
    let c1 = chats.iter().find(|c| c.chat.external_id == "c1").unwrap();
    assert_eq!(c1.chat.name, "Jane Doe");
    assert_eq!(c1.chat.unread_count, 4);
}

#[tokio::test]
async fn test_is_from_me_follows_account_identity() {
    let h = synced_harness().await;
    let mut own = inbound("m1", "Hello from the team", 1_000);
    own.sender_id = ACCOUNT.to_string();
    h.gateway.push_message("c1", own);
    h.gateway.push_message("c1", inbound("m2", "Hello back", 2_000));

    h.engine.sync_messages_for_chat("c1").await.unwrap();

    let chat = h.store.find_chat("c1").await.unwrap().unwrap();
    let messages = h.store.list_messages(chat.id, 50).await.unwrap();
    assert!(messages[0].is_from_me);
    assert!(!messages[1].is_from_me);
}

#[tokio::test]
async fn test_attachments_are_stored_as_payload() {
    let h = synced_harness().await;
    let mut file = inbound("m1", "", 1_000);
    file.text = None;
    file.kind = gateway::MessageKind::File;
    file.attachments = vec![gateway::Attachment::new("https://cdn.example/invoice.pdf")];
    h.gateway.push_message("c1", file);

    let report = h.engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(report.processed_count, 1);
    assert_eq!(report.alerts_created, 0);

    let chat = h.store.find_chat("c1").await.unwrap().unwrap();
    let stored = &h.store.list_messages(chat.id, 50).await.unwrap()[0];
    assert_eq!(stored.kind, "FILE");
    assert_eq!(stored.sentiment_score, Some(50));
    assert!(stored.attachments.as_deref().unwrap().contains("invoice.pdf"));
}

#[tokio::test]
async fn test_page_size_limits_fetch() {
    let gateway = seeded_gateway();
    let h = harness_with(gateway, PipelineConfig::default().with_page_size(2)).await;
    h.engine.bind_account(ACCOUNT, WORKSPACE).await.unwrap();
    h.engine.sync_chats_for_account(ACCOUNT).await.unwrap();
    for i in 1..=5 {
        h.gateway
            .push_message("c1", inbound(&format!("m{}", i), "hello", i * 1_000));
    }

    let report = h.engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(report.processed_count, 2);

    let chat = h.store.find_chat("c1").await.unwrap().unwrap();
    let ids: Vec<_> = h
        .store
        .list_messages(chat.id, 50)
        .await
        .unwrap()
        .into_iter()
        .map(|m| m.external_id)
        .collect();
    assert_eq!(ids, ["m4", "m5"]);
}

#[tokio::test]
async fn test_unbound_account_is_rejected_by_default() {
    let h = harness().await;

    let err = h.engine.sync_chats_for_account(ACCOUNT).await.unwrap_err();
    assert!(matches!(err, PipelineError::UnboundAccount(ref id) if id == ACCOUNT));
    assert_eq!(h.gateway.calls().total(), 0);
    assert!(h.store.find_account(ACCOUNT).await.unwrap().is_none());
}

#[tokio::test]
async fn test_fallback_policy_provisions_into_first_workspace() {
    let config =
        PipelineConfig::default().with_provisioning(ProvisioningPolicy::FirstAvailableWorkspace);
    let h = harness_with(seeded_gateway(), config).await;

    let report = h.engine.sync_chats_for_account(ACCOUNT).await.unwrap();
    assert_eq!(report.created, 1);

    let account = h.store.find_account(ACCOUNT).await.unwrap().unwrap();
    assert_eq!(account.workspace_id, WORKSPACE);
    assert_eq!(account.provider, "WHATSAPP");
    assert_eq!(account.name, "Support line");
}

#[tokio::test]
async fn test_fallback_policy_without_workspace() {
    let config =
        PipelineConfig::default().with_provisioning(ProvisioningPolicy::FirstAvailableWorkspace);
    let h = harness_over(test_db().await, Arc::new(seeded_gateway()), config);

    let err = h.engine.sync_chats_for_account(ACCOUNT).await.unwrap_err();
    assert!(matches!(err, PipelineError::NoWorkspace(_)));
}

#[tokio::test]
async fn test_bind_account_rules() {
    let h = harness().await;

    let err = h.engine.bind_account(ACCOUNT, "missing").await.unwrap_err();
    assert!(matches!(err, PipelineError::UnknownWorkspace(_)));

    let bound = h.engine.bind_account(ACCOUNT, WORKSPACE).await.unwrap();
    assert_eq!(bound.workspace_id, WORKSPACE);

    // Rebinding to the same workspace is allowed
    let again = h.engine.bind_account(ACCOUNT, WORKSPACE).await.unwrap();
    assert_eq!(again.id, bound.id);

    database::workspace::create_workspace(h.db.pool(), "ws-2", "Sales")
        .await
        .unwrap();
    let err = h.engine.bind_account(ACCOUNT, "ws-2").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::AlreadyBound { ref workspace, .. } if workspace == WORKSPACE
    ));

    let unknown = h.engine.bind_account("nobody", WORKSPACE).await.unwrap_err();
    assert!(matches!(
        unknown,
        PipelineError::Gateway(GatewayError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_unknown_chat() {
    let h = synced_harness().await;
    let err = h.engine.sync_messages_for_chat("nope").await.unwrap_err();
    assert!(matches!(err, PipelineError::UnknownChat(_)));
}

#[tokio::test]
async fn test_gateway_failure_fails_the_call() {
    let h = synced_harness().await;
    h.gateway.push_message("c1", inbound("m1", "hello", 1_000));
    h.gateway.set_unreachable(true);

    let err = h.engine.sync_messages_for_chat("c1").await.unwrap_err();
    assert!(matches!(err, PipelineError::Gateway(GatewayError::Unreachable(_))));

    let chat = h.store.find_chat("c1").await.unwrap().unwrap();
    assert!(h.store.list_messages(chat.id, 50).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_gateway_timeout() {
    let db = test_db().await;
    database::workspace::create_workspace(db.pool(), WORKSPACE, "Support")
        .await
        .unwrap();
    let account = account::upsert_account(
        db.pool(),
        &NewAccount {
            external_id: ACCOUNT.to_string(),
            workspace_id: WORKSPACE.to_string(),
            provider: "WHATSAPP".to_string(),
            name: "Support line".to_string(),
        },
    )
    .await
    .unwrap();
    chat::upsert_chat(
        db.pool(),
        &ChatUpsert {
            external_id: "c1".to_string(),
            account_id: account.id,
            name: "Customer".to_string(),
            chat_type: "single".to_string(),
            last_message_text: None,
            last_message_at: None,
            unread_count: 0,
        },
    )
    .await
    .unwrap();

    let gateway = Arc::new(seeded_gateway().with_delay(Duration::from_millis(500)));
    let config = PipelineConfig::default().with_gateway_timeout(Duration::from_millis(20));
    let h = harness_over(db, gateway, config);

    let err = h.engine.sync_messages_for_chat("c1").await.unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Timeout {
            operation: "list_messages",
            ..
        }
    ));
}

/// Store that fails or misreports selected messages.
struct FlakyStore {
    inner: SqliteStore,
    fail_ingest_of: Option<&'static str>,
    hide_existing: bool,
}

#[async_trait]
impl InboxStore for FlakyStore {
    async fn find_workspace(&self, id: &str) -> database::Result<Option<Workspace>> {
        self.inner.find_workspace(id).await
    }
    async fn first_workspace(&self) -> database::Result<Option<Workspace>> {
        self.inner.first_workspace().await
    }
    async fn find_account(&self, external_id: &str) -> database::Result<Option<Account>> {
        self.inner.find_account(external_id).await
    }
    async fn upsert_account(&self, new_account: &NewAccount) -> database::Result<Account> {
        self.inner.upsert_account(new_account).await
    }
    async fn find_chat(&self, external_id: &str) -> database::Result<Option<Chat>> {
        self.inner.find_chat(external_id).await
    }
    async fn get_chat(&self, id: i64) -> database::Result<Chat> {
        self.inner.get_chat(id).await
    }
    async fn get_account(&self, id: i64) -> database::Result<Account> {
        self.inner.get_account(id).await
    }
    async fn upsert_chat(&self, upsert: &ChatUpsert) -> database::Result<Chat> {
        self.inner.upsert_chat(upsert).await
    }
    async fn list_chats(&self, account_id: i64) -> database::Result<Vec<ChatSummary>> {
        self.inner.list_chats(account_id).await
    }
    async fn message_exists(&self, external_id: &str) -> database::Result<bool> {
        if self.hide_existing {
            return Ok(false);
        }
        self.inner.message_exists(external_id).await
    }
    async fn ingest_message(
        &self,
        new_message: &NewMessage,
        alerts: &[NewAlert],
    ) -> database::Result<Message> {
        if self.fail_ingest_of == Some(new_message.external_id.as_str()) {
            return Err(DatabaseError::NotFound {
                entity: "Chat",
                id: new_message.chat_id.to_string(),
            });
        }
        self.inner.ingest_message(new_message, alerts).await
    }
    async fn record_outbound(
        &self,
        new_message: &NewMessage,
        preview: &str,
    ) -> database::Result<Message> {
        self.inner.record_outbound(new_message, preview).await
    }
    async fn get_message(&self, id: i64) -> database::Result<Message> {
        self.inner.get_message(id).await
    }
    async fn update_message_text(&self, id: i64, text: &str) -> database::Result<Message> {
        self.inner.update_message_text(id, text).await
    }
    async fn list_messages(&self, chat_id: i64, limit: i64) -> database::Result<Vec<Message>> {
        self.inner.list_messages(chat_id, limit).await
    }
    async fn list_alerts(
        &self,
        workspace_id: &str,
        include_resolved: bool,
    ) -> database::Result<Vec<Alert>> {
        self.inner.list_alerts(workspace_id, include_resolved).await
    }
}

fn flaky_engine(
    h: &Harness,
    fail_ingest_of: Option<&'static str>,
    hide_existing: bool,
) -> SyncEngine {
    let store = FlakyStore {
        inner: SqliteStore::new(h.db.clone()),
        fail_ingest_of,
        hide_existing,
    };
    SyncEngine::new(
        h.gateway.clone() as Arc<dyn Gateway>,
        Arc::new(store),
        PipelineConfig::default(),
    )
}

#[tokio::test]
async fn test_one_failing_message_does_not_stop_the_page() {
    let h = synced_harness().await;
    h.gateway.push_message("c1", inbound("m1", "hello", 1_000));
    h.gateway.push_message("c1", inbound("m2", "This is terrible", 2_000));
    h.gateway.push_message("c1", inbound("m3", "bye", 3_000));

    let engine = flaky_engine(&h, Some("m2"), false);
    let report = engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(report.processed_count, 2);
    assert_eq!(report.failed_count, 1);
    assert_eq!(report.alerts_created, 0);

    let orphaned = alert::count_alerts_for_message(h.db.pool(), "m2").await.unwrap();
    assert_eq!(orphaned, 0);

    // The failed message is picked up by the next sync
    let retry = h.engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(retry.processed_count, 1);
    assert_eq!(retry.skipped_count, 2);
    assert_eq!(retry.alerts_created, 1);
}

#[tokio::test]
async fn test_duplicate_at_insert_counts_as_skip_without_alerts() {
    let h = synced_harness().await;
    h.gateway.push_message("c1", inbound("m1", "Terrible delay", 1_000));
    let first = h.engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(first.alerts_created, 2);

    // Simulates losing a race: the existence check passes but the insert collides
    let engine = flaky_engine(&h, None, true);
    let report = engine.sync_messages_for_chat("c1").await.unwrap();
    assert_eq!(report.processed_count, 0);
    assert_eq!(report.skipped_count, 1);
    assert_eq!(report.failed_count, 0);

    let alerts = alert::count_alerts_for_message(h.db.pool(), "m1").await.unwrap();
    assert_eq!(alerts, 2);
}

/// Provider whose message listing fails for one chat.
struct BrokenChatGateway {
    inner: Arc<MockGateway>,
    broken_chat: &'static str,
}

#[async_trait]
impl Gateway for BrokenChatGateway {
    async fn get_account(&self, external_id: &str) -> Result<RemoteAccount, GatewayError> {
        self.inner.get_account(external_id).await
    }

    async fn list_chats(&self, account_external_id: &str) -> Result<Vec<RemoteChat>, GatewayError> {
        self.inner.list_chats(account_external_id).await
    }

    async fn list_messages(
        &self,
        chat_external_id: &str,
        page_size: u32,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        if chat_external_id == self.broken_chat {
            return Err(GatewayError::Status {
                status: 500,
                body: "internal error".to_string(),
            });
        }
        self.inner.list_messages(chat_external_id, page_size).await
    }

    async fn send_message(&self, request: &SendRequest) -> Result<SentMessage, GatewayError> {
        self.inner.send_message(request).await
    }

    async fn edit_message(
        &self,
        message_external_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.inner.edit_message(message_external_id, text).await
    }

    fn name(&self) -> &str {
        "broken-chat"
    }
}

#[tokio::test]
async fn test_account_sync_continues_past_failing_chat() {
    let h = harness().await;
    h.gateway.add_chat(ACCOUNT, remote_chat("c2"));
    h.gateway.add_chat(ACCOUNT, remote_chat("c3"));
    h.gateway.push_message("c1", inbound("m1", "hello", 1_000));
    h.gateway.push_message(
        "c3",
        inbound("m3", "Thanks, great, excellent, amazing, perfect", 3_000),
    );
    h.engine.bind_account(ACCOUNT, WORKSPACE).await.unwrap();

    let engine = SyncEngine::new(
        Arc::new(BrokenChatGateway {
            inner: h.gateway.clone(),
            broken_chat: "c2",
        }),
        h.store.clone() as Arc<dyn InboxStore>,
        PipelineConfig::default(),
    );

    let report = engine.sync_account(ACCOUNT).await.unwrap();
    assert_eq!(report.chats.synced_count, 3);
    assert_eq!(report.messages.processed_count, 2);
    assert_eq!(report.messages.alerts_created, 1);
    assert_eq!(report.failed_chats, ["c2"]);

    let alerts = h.store.list_alerts(WORKSPACE, false).await.unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].kind, "POSITIVE");
    assert_eq!(alerts[0].action_label, "Offer upgrade");
}

/// Provider whose first chat listing runs into its request timeout.
struct SlowFirstListGateway {
    inner: Arc<MockGateway>,
    request_timeout: Duration,
    list_chats_calls: AtomicU32,
}

#[async_trait]
impl Gateway for SlowFirstListGateway {
    async fn get_account(&self, external_id: &str) -> Result<RemoteAccount, GatewayError> {
        self.inner.get_account(external_id).await
    }

    async fn list_chats(&self, account_external_id: &str) -> Result<Vec<RemoteChat>, GatewayError> {
        if self.list_chats_calls.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.request_timeout).await;
            return Err(GatewayError::Timeout(self.request_timeout));
        }
        self.inner.list_chats(account_external_id).await
    }

    async fn list_messages(
        &self,
        chat_external_id: &str,
        page_size: u32,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        self.inner.list_messages(chat_external_id, page_size).await
    }

    async fn send_message(&self, request: &SendRequest) -> Result<SentMessage, GatewayError> {
        self.inner.send_message(request).await
    }

    async fn edit_message(
        &self,
        message_external_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        self.inner.edit_message(message_external_id, text).await
    }

    fn name(&self) -> &str {
        "slow-first-list"
    }
}

#[tokio::test]
async fn test_timed_out_request_is_retried_within_operation_budget() {
    let h = harness().await;
    h.engine.bind_account(ACCOUNT, WORKSPACE).await.unwrap();

    let request_timeout = Duration::from_millis(100);
    let policy = RetryPolicy::default()
        .with_max_retries(2)
        .with_initial_delay(Duration::from_millis(5));
    let gateway = Arc::new(RetryingGateway::new(
        SlowFirstListGateway {
            inner: h.gateway.clone(),
            request_timeout,
            list_chats_calls: AtomicU32::new(0),
        },
        policy.clone(),
    ));
    let engine = SyncEngine::new(
        gateway.clone() as Arc<dyn Gateway>,
        h.store.clone() as Arc<dyn InboxStore>,
        PipelineConfig::default().with_gateway_timeout(policy.operation_budget(request_timeout)),
    );

    let report = engine.sync_chats_for_account(ACCOUNT).await.unwrap();
    assert_eq!(report.synced_count, 1);
    assert_eq!(gateway.inner().list_chats_calls.load(Ordering::SeqCst), 2);
}
