//! In-memory gateway for tests.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;

use crate::error::GatewayError;
use crate::gateway::Gateway;
use crate::types::{
    MessageKind, RemoteAccount, RemoteChat, RemoteMessage, SendRequest, SentMessage,
};

/// Timestamp of the first message the mock assigns.
const MOCK_EPOCH_MS: i64 = 1_700_000_000_000;

/// Number of calls made to each gateway operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallCounts {
    pub get_account: usize,
    pub list_chats: usize,
    pub list_messages: usize,
    pub send_message: usize,
    pub edit_message: usize,
}

impl CallCounts {
    /// Total calls across all operations.
    pub fn total(&self) -> usize {
        self.get_account
            + self.list_chats
            + self.list_messages
            + self.send_message
            + self.edit_message
    }
}

#[derive(Default)]
struct MockState {
    accounts: HashMap<String, RemoteAccount>,
    chats: HashMap<String, Vec<RemoteChat>>,
    chat_owner: HashMap<String, String>,
    messages: HashMap<String, Vec<RemoteMessage>>,
    next_id: u64,
    clock: i64,
    unreachable: bool,
    reject_sends: bool,
    transient_failures: u32,
    calls: CallCounts,
    sent: Vec<SendRequest>,
    edits: Vec<(String, String)>,
}

/// A scriptable in-memory provider.
///
/// Accounts, chats and messages are seeded by the test. Sends are appended to
/// the chat with deterministic IDs (`sent-1`, `sent-2`, ...). Failures can be
/// injected per call or for the whole provider.
pub struct MockGateway {
    state: Mutex<MockState>,
    delay: Option<Duration>,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                clock: MOCK_EPOCH_MS,
                ..Default::default()
            }),
            delay: None,
        }
    }

    /// Delay every answer by the given duration.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Register an account.
    pub fn with_account(self, external_id: &str, name: &str, provider: &str) -> Self {
        self.add_account(external_id, name, provider);
        self
    }

    /// Register a chat under an account.
    pub fn with_chat(self, account_external_id: &str, chat: RemoteChat) -> Self {
        self.add_chat(account_external_id, chat);
        self
    }

    /// Register an account.
    pub fn add_account(&self, external_id: &str, name: &str, provider: &str) {
        self.state().accounts.insert(
            external_id.to_string(),
            RemoteAccount {
                name: name.to_string(),
                provider: provider.to_string(),
            },
        );
    }

    /// Register or replace a chat under an account.
    pub fn add_chat(&self, account_external_id: &str, chat: RemoteChat) {
        let mut state = self.state();
        state
            .chat_owner
            .insert(chat.id.clone(), account_external_id.to_string());
        state.messages.entry(chat.id.clone()).or_default();
        let chats = state
            .chats
            .entry(account_external_id.to_string())
            .or_default();
        chats.retain(|c| c.id != chat.id);
        chats.push(chat);
    }

    /// Append a message to a chat's remote history.
    pub fn push_message(&self, chat_external_id: &str, message: RemoteMessage) {
        self.state()
            .messages
            .entry(chat_external_id.to_string())
            .or_default()
            .push(message);
    }

    /// Make every call fail as if the provider were down.
    pub fn set_unreachable(&self, unreachable: bool) {
        self.state().unreachable = unreachable;
    }

    /// Make sends fail with a provider-side rejection.
    pub fn set_reject_sends(&self, reject: bool) {
        self.state().reject_sends = reject;
    }

    /// Fail the next `count` calls with a connection error.
    pub fn fail_next(&self, count: u32) {
        self.state().transient_failures = count;
    }

    /// Calls made so far.
    pub fn calls(&self) -> CallCounts {
        self.state().calls.clone()
    }

    /// Send requests that the provider accepted.
    pub fn sent(&self) -> Vec<SendRequest> {
        self.state().sent.clone()
    }

    /// Edits that the provider accepted, as (message ID, new text).
    pub fn edits(&self) -> Vec<(String, String)> {
        self.state().edits.clone()
    }

    /// The remote history of a chat.
    pub fn messages(&self, chat_external_id: &str) -> Vec<RemoteMessage> {
        self.state()
            .messages
            .get(chat_external_id)
            .cloned()
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Wait out the configured delay, then count the call and apply injected failures.
    async fn enter(
        &self,
        count: fn(&mut CallCounts),
    ) -> Result<MutexGuard<'_, MockState>, GatewayError> {
        if let Some(delay) = self.delay {
            sleep(delay).await;
        }

        let mut state = self.state();
        count(&mut state.calls);

        if state.transient_failures > 0 {
            state.transient_failures -= 1;
            return Err(GatewayError::Unreachable("connection refused".to_string()));
        }
        if state.unreachable {
            return Err(GatewayError::Unreachable("connection refused".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl Gateway for MockGateway {
    async fn get_account(&self, external_id: &str) -> Result<RemoteAccount, GatewayError> {
        let state = self.enter(|c| c.get_account += 1).await?;
        state
            .accounts
            .get(external_id)
            .cloned()
            .ok_or_else(|| GatewayError::NotFound {
                entity: "account",
                id: external_id.to_string(),
            })
    }

    async fn list_chats(&self, account_external_id: &str) -> Result<Vec<RemoteChat>, GatewayError> {
        let state = self.enter(|c| c.list_chats += 1).await?;
        if !state.accounts.contains_key(account_external_id) {
            return Err(GatewayError::NotFound {
                entity: "account",
                id: account_external_id.to_string(),
            });
        }
        Ok(state
            .chats
            .get(account_external_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn list_messages(
        &self,
        chat_external_id: &str,
        page_size: u32,
    ) -> Result<Vec<RemoteMessage>, GatewayError> {
        let state = self.enter(|c| c.list_messages += 1).await?;
        let Some(history) = state.messages.get(chat_external_id) else {
            return Err(GatewayError::NotFound {
                entity: "chat",
                id: chat_external_id.to_string(),
            });
        };

        let mut page = history.clone();
        page.sort_by_key(|m| m.timestamp);
        let skip = page.len().saturating_sub(page_size as usize);
        Ok(page.split_off(skip))
    }

    async fn send_message(&self, request: &SendRequest) -> Result<SentMessage, GatewayError> {
        let mut state = self.enter(|c| c.send_message += 1).await?;
        if state.reject_sends {
            return Err(GatewayError::Rpc {
                code: -32000,
                message: "message rejected by provider".to_string(),
            });
        }
        let Some(account_id) = state.chat_owner.get(&request.chat_id).cloned() else {
            return Err(GatewayError::NotFound {
                entity: "chat",
                id: request.chat_id.clone(),
            });
        };

        state.next_id += 1;
        state.clock += 1000;
        let id = format!("sent-{}", state.next_id);
        let timestamp = state.clock;

        let (kind, attachments) = match &request.voice_attachment {
            Some(voice) => (MessageKind::Voice, vec![voice.clone()]),
            None if !request.attachments.is_empty() => {
                (MessageKind::File, request.attachments.clone())
            }
            None => (MessageKind::Text, Vec::new()),
        };

        state
            .messages
            .entry(request.chat_id.clone())
            .or_default()
            .push(RemoteMessage {
                id: id.clone(),
                sender_id: account_id.clone(),
                account_id: account_id.clone(),
                text: request.text.clone(),
                attachments: attachments.clone(),
                timestamp,
                kind,
            });
        state.sent.push(request.clone());

        Ok(SentMessage {
            id,
            sender_id: account_id.clone(),
            account_id,
            timestamp,
            attachments,
        })
    }

    async fn edit_message(
        &self,
        message_external_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        let mut guard = self.enter(|c| c.edit_message += 1).await?;
        let state = &mut *guard;
        let found = state
            .messages
            .values_mut()
            .flat_map(|history| history.iter_mut())
            .find(|m| m.id == message_external_id);

        match found {
            Some(message) => {
                message.text = Some(text.to_string());
                state
                    .edits
                    .push((message_external_id.to_string(), text.to_string()));
                Ok(())
            }
            None => Err(GatewayError::NotFound {
                entity: "message",
                id: message_external_id.to_string(),
            }),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}
