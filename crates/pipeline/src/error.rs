//! Error types for pipeline operations.

use std::time::Duration;

use database::DatabaseError;
use gateway::GatewayError;
use thiserror::Error;

use crate::delivery::TransitionError;
use crate::validation::ValidationError;

/// Errors that can occur while syncing or sending.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The messaging provider failed.
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    /// Local storage failed.
    #[error("storage error: {0}")]
    Database(#[from] DatabaseError),

    /// A gateway call did not finish within the configured timeout.
    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// The account has no local record and automatic provisioning is disabled.
    #[error("account {0} is not bound to a workspace")]
    UnboundAccount(String),

    /// Automatic provisioning found no workspace to attach the account to.
    #[error("no workspace available for account {0}")]
    NoWorkspace(String),

    /// The chat has no local record.
    #[error("unknown chat: {0}")]
    UnknownChat(String),

    /// The account already belongs to another workspace.
    #[error("account {account} is already bound to workspace {workspace}")]
    AlreadyBound { account: String, workspace: String },

    /// The workspace does not exist.
    #[error("unknown workspace: {0}")]
    UnknownWorkspace(String),

    /// The message does not exist.
    #[error("unknown message: {0}")]
    UnknownMessage(i64),

    /// Attachment metadata could not be encoded for storage.
    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    /// A pending message was moved to a state it cannot reach.
    #[error(transparent)]
    Transition(#[from] TransitionError),

    /// The provider accepted a message but it could not be stored locally.
    ///
    /// The message exists at the provider; the next message sync stores it.
    #[error("message {external_id} was sent but not stored: {reason}")]
    Unrecorded { external_id: String, reason: String },

    /// Outbound content was rejected before any I/O.
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationError),
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
