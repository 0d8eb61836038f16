//! SQLite persistence layer for Switchboard.
//!
//! This crate provides async database operations for workspaces, platform
//! accounts, chats, messages and sentiment alerts using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{account, workspace, Database, NewAccount};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:switchboard.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Register an account under a workspace
//!     workspace::create_workspace(db.pool(), "acme", "Acme Support").await?;
//!     let account = account::upsert_account(
//!         db.pool(),
//!         &NewAccount {
//!             external_id: "acc-1".to_string(),
//!             workspace_id: "acme".to_string(),
//!             provider: "WHATSAPP".to_string(),
//!             name: "Support line".to_string(),
//!         },
//!     )
//!     .await?;
//!     println!("account {}", account.id);
//!
//!     Ok(())
//! }
//! ```

pub mod account;
pub mod alert;
pub mod chat;
pub mod error;
pub mod message;
pub mod models;
pub mod workspace;

pub use error::{DatabaseError, Result};
pub use models::{
    Account, Alert, Chat, ChatSummary, ChatUpsert, Message, NewAccount, NewAlert, NewMessage,
    Workspace,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sync passes and outbound sends share the pool.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// // File database
    /// let db = database::Database::connect("sqlite:data/switchboard.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Begin a transaction on the pool.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
