//! Application state shared across handlers.

use std::sync::Arc;

use database::Database;
use gateway::Gateway;
use pipeline::{InboxStore, OutboundCoordinator, PipelineConfig, SqliteStore, SyncEngine};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Local inbox storage.
    pub store: Arc<SqliteStore>,
    /// Provider-to-storage sync.
    pub sync: Arc<SyncEngine>,
    /// Operator sends and edits.
    pub outbound: Arc<OutboundCoordinator>,
}

impl AppState {
    /// Create new application state.
    pub fn new(db: Database, gateway: Arc<dyn Gateway>, config: PipelineConfig) -> Self {
        let store = Arc::new(SqliteStore::new(db));
        let sync = SyncEngine::new(
            gateway.clone(),
            store.clone() as Arc<dyn InboxStore>,
            config.clone(),
        );
        let outbound = OutboundCoordinator::new(gateway, store.clone() as Arc<dyn InboxStore>, config);

        Self {
            store,
            sync: Arc::new(sync),
            outbound: Arc::new(outbound),
        }
    }
}
