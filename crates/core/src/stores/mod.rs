//! Store contracts.
//!
//! The pipeline writes to two stores with different guarantees:
//! - [`CacheStore`]: ephemeral last-snapshot-per-symbol, used for deltas
//! - [`DurableStore`]: append-only history, the source of truth
//!
//! Each store owns its connection lifecycle. The scheduler only observes it
//! through availability queries and never drives a store's state directly.

mod cache;
mod connection;
mod durable;

pub use cache::CacheStore;
pub use connection::{ConnectionState, ConnectionStateCell, StoreKind};
pub use durable::{DurableStore, HistoryBatch, HistoryRecord};
