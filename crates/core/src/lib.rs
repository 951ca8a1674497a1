//! Quotefeed Core - ingestion pipeline, store contracts and events.
//!
//! This crate contains the orchestration logic of the quote pipeline.
//! It is storage-agnostic: the cache and the durable store are reached only
//! through the [`CacheStore`] and [`DurableStore`] traits, implemented by the
//! `cache-redis` and `storage-sqlite` crates.

pub mod constants;
pub mod errors;
pub mod events;
pub mod ingestion;
pub mod stores;

// Re-export error types
pub use errors::Error;
pub use errors::Result;

pub use events::{IngestEvent, IngestEventSink, TickStatus};
pub use ingestion::{
    IngestConfig, IngestionContext, IngestionJob, IngestionScheduler, JobConfig, JobState,
    RetryPolicy, TickOutcome,
};
pub use stores::{CacheStore, ConnectionState, DurableStore, HistoryBatch, HistoryRecord, StoreKind};
