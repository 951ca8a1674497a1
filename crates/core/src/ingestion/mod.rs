//! Ingestion pipeline.
//!
//! One [`IngestionJob`] per symbol set runs the fetch-parse-persist cycle;
//! the [`IngestionScheduler`] drives every job on a fixed cadence.
//!
//! ```text
//! tick -> Source.fetch -> Parser.parse -> Cache.read_snapshots (deltas)
//!      -> Durable.write_batch (bounded retry) -> Cache.write_snapshot (best effort)
//! ```

mod availability;
mod config;
mod delta;
mod job;
mod outcome;
mod scheduler;
mod state;


pub use availability::AvailabilityTracker;
pub use config::{IngestConfig, JobConfig, RetryPolicy};
pub use delta::{compute_deltas, Deltas};
pub use job::{IngestionContext, IngestionJob};
pub use outcome::{PersistOutcome, TickOutcome, TickReport};
pub use scheduler::IngestionScheduler;
pub use state::JobState;
