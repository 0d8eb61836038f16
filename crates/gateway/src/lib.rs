//! Messaging-provider gateway for Switchboard.
//!
//! The gateway is the only path between the inbox and an external messaging
//! provider. It provides:
//!
//! - The [`Gateway`] trait (account lookup, chat and message listing, send, edit)
//! - [`HttpGateway`], a JSON-RPC client for providers speaking the unified API
//! - [`RetryingGateway`], bounded retries with jittered backoff for transient failures
//! - [`MockGateway`] (feature `mock`), a scriptable in-memory provider for tests
//!
//! # Example
//!
//! ```no_run
//! use gateway::{Gateway, GatewayConfig, HttpGateway, RetryPolicy, RetryingGateway};
//!
//! # async fn example() -> Result<(), gateway::GatewayError> {
//! let config = GatewayConfig::new("http://localhost:8080").with_api_key("secret");
//! let client = HttpGateway::connect(config).await?;
//! let gateway = RetryingGateway::new(client, RetryPolicy::default());
//!
//! for chat in gateway.list_chats("acct-1").await? {
//!     println!("{}: {} unread", chat.name, chat.unread_count);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod retry;
pub mod types;

pub use async_trait::async_trait;
pub use client::HttpGateway;
pub use config::{GatewayConfig, DEFAULT_TIMEOUT};
pub use error::GatewayError;
pub use gateway::Gateway;
#[cfg(any(test, feature = "mock"))]
pub use mock::{CallCounts, MockGateway};
pub use retry::{RetryPolicy, RetryingGateway};
pub use types::*;
