//! Shared fixtures for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use database::{workspace, Database};
use gateway::{Gateway, MessageKind, MockGateway, RemoteChat, RemoteMessage};
use pipeline::{InboxStore, OutboundCoordinator, PipelineConfig, SqliteStore, SyncEngine};

pub const WORKSPACE: &str = "ws-1";
pub const ACCOUNT: &str = "acct";
pub const CUSTOMER: &str = "customer-1";

pub struct Harness {
    pub db: Database,
    pub gateway: Arc<MockGateway>,
    pub store: Arc<SqliteStore>,
    pub engine: SyncEngine,
    pub outbound: OutboundCoordinator,
}

pub async fn test_db() -> Database {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    db.migrate().await.unwrap();
    db
}

pub fn remote_chat(id: &str) -> RemoteChat {
    RemoteChat {
        id: id.to_string(),
        name: format!("Chat {}", id),
        chat_type: "single".to_string(),
        unread_count: 1,
        last_message_text: None,
        timestamp: None,
    }
}

pub fn inbound(id: &str, text: &str, timestamp: i64) -> RemoteMessage {
    RemoteMessage {
        id: id.to_string(),
        sender_id: CUSTOMER.to_string(),
        account_id: ACCOUNT.to_string(),
        text: Some(text.to_string()),
        attachments: Vec::new(),
        timestamp,
        kind: MessageKind::Text,
    }
}

/// A provider with one account and one chat.
pub fn seeded_gateway() -> MockGateway {
    MockGateway::new()
        .with_account(ACCOUNT, "Support line", "WHATSAPP")
        .with_chat(ACCOUNT, remote_chat("c1"))
}

/// Build components over a fresh database with one workspace.
pub async fn harness_with(gateway: MockGateway, config: PipelineConfig) -> Harness {
    let db = test_db().await;
    workspace::create_workspace(db.pool(), WORKSPACE, "Support")
        .await
        .unwrap();
    harness_over(db, Arc::new(gateway), config)
}

pub fn harness_over(db: Database, gateway: Arc<MockGateway>, config: PipelineConfig) -> Harness {
    let store = Arc::new(SqliteStore::new(db.clone()));
    let engine = SyncEngine::new(
        gateway.clone() as Arc<dyn Gateway>,
        store.clone() as Arc<dyn InboxStore>,
        config.clone(),
    );
    let outbound = OutboundCoordinator::new(
        gateway.clone() as Arc<dyn Gateway>,
        store.clone() as Arc<dyn InboxStore>,
        config,
    );
    Harness {
        db,
        gateway,
        store,
        engine,
        outbound,
    }
}

pub async fn harness() -> Harness {
    harness_with(seeded_gateway(), PipelineConfig::default()).await
}

/// A harness whose account is bound and whose chat list is synced.
pub async fn synced_harness() -> Harness {
    let h = harness().await;
    h.engine.bind_account(ACCOUNT, WORKSPACE).await.unwrap();
    h.engine.sync_chats_for_account(ACCOUNT).await.unwrap();
    h
}
