//! SQLite durable store for quotefeed.
//!
//! This crate is the only place in the workspace where Diesel dependencies
//! exist. It implements the [`DurableStore`](quotefeed_core::DurableStore)
//! trait from `quotefeed-core` and contains:
//! - Database initialization and connection pooling
//! - Embedded Diesel migrations
//! - The single writer actor all inserts go through
//! - The `quote_history` table model and repository
//!
//! ```text
//!      core (IngestionJob)
//!              │ DurableStore
//!              ▼
//!   storage-sqlite (this crate)
//!              │
//!              ▼
//!          SQLite DB
//! ```

pub mod db;
pub mod errors;
pub mod history;
pub mod schema;

// Re-export database utilities
pub use db::{create_pool, get_connection, init, run_migrations, DbConnection, DbPool, WriteHandle};

// Re-export storage errors and conversion helpers
pub use errors::{IntoCore, StorageError};

pub use history::SqliteDurableStore;

// Re-export from quotefeed-core for convenience
pub use quotefeed_core::errors::{DatabaseError, Error, Result};
