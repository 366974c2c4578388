//! SQLite persistence layer for Waggle.
//!
//! This crate provides async database operations for threads, messages, read
//! receipts, and agent presence using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, Importance, message, thread};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:waggle.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     // Open a thread and post to it
//!     let members = vec!["devin".to_string()];
//!     let thread = thread::create_thread(db.pool(), "Build X", "ralph", &members, None, None).await?;
//!     message::send_message(db.pool(), thread.id, "ralph", "start", Importance::Normal, None).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod channel;
pub mod error;
pub mod message;
pub mod models;
pub mod presence;
pub mod receipt;
pub mod stats;
pub mod thread;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    AgentPresence, Channel, ChannelKind, Importance, Message, ReadReceipt, Thread, ThreadStatus,
};
pub use validation::ValidationError;

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
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
    /// let db = database::Database::connect("sqlite:data/waggle.db?mode=rwc").await?;
    ///
    /// // In-memory database (for testing)
    /// let db = database::Database::connect("sqlite::memory:").await?;
    /// # Ok(())
    /// # }
    /// ```
    /// Default pool size for database connections.
    /// SQLite in WAL mode commits one writer at a time, so a handful of
    /// connections is plenty for per-invocation callers and a polled API.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// How long a connection waits on a locked database before reporting busy.
    const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Self::BUSY_TIMEOUT);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(Duration::from_secs(30))
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

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Database;

    /// In-memory database with migrations applied. A single connection keeps
    /// every query on the same in-memory file.
    pub(crate) async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }
}
