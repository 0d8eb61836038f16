//! Conversation sync, sentiment alerting and outbound messaging.
//!
//! This crate connects a messaging provider ([`gateway::Gateway`]) to local
//! storage ([`InboxStore`]):
//!
//! - [`SyncEngine`] pulls chats and messages, scoring each new message and
//!   storing it together with any alerts it raises
//! - [`OutboundCoordinator`] validates, sends, stores and edits operator messages
//! - [`PendingMessage`] tracks a send from composing to delivered or failed
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use database::Database;
//! use gateway::{GatewayConfig, HttpGateway};
//! use pipeline::{PipelineConfig, SqliteStore, SyncEngine};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Database::connect("sqlite:switchboard.db?mode=rwc").await?;
//! db.migrate().await?;
//!
//! let gateway = Arc::new(HttpGateway::new(GatewayConfig::new("http://localhost:8080"))?);
//! let store = Arc::new(SqliteStore::new(db));
//! let engine = SyncEngine::new(gateway, store, PipelineConfig::default());
//!
//! let report = engine.sync_account("acct-1").await?;
//! println!("{} new messages", report.messages.processed_count);
//! # Ok(())
//! # }
//! ```

pub mod alerts;
pub mod config;
pub mod delivery;
pub mod error;
pub mod outbound;
pub mod store;
pub mod sync;
pub mod validation;

pub use alerts::{AlertEvaluator, Evaluation};
pub use config::{PipelineConfig, ProvisioningPolicy, DEFAULT_GATEWAY_TIMEOUT, DEFAULT_PAGE_SIZE};
pub use delivery::{DeliveryStatus, PendingMessage, TransitionError};
pub use error::{PipelineError, Result};
pub use outbound::{OutboundAttachments, OutboundCoordinator, OutboundDraft};
pub use store::{InboxStore, SqliteStore};
pub use sync::{AccountSyncReport, ChatSyncReport, MessageSyncReport, SyncEngine};
pub use validation::{ValidationError, MAX_TEXT_LENGTH};

use std::future::Future;
use std::time::Duration;

use gateway::GatewayError;
use tokio::time::timeout;

/// Run a gateway call, failing with [`PipelineError::Timeout`] if it takes too long.
pub(crate) async fn within<T, F>(operation: &'static str, after: Duration, call: F) -> Result<T>
where
    F: Future<Output = std::result::Result<T, GatewayError>>,
{
    match timeout(after, call).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(PipelineError::Timeout { operation, after }),
    }
}
