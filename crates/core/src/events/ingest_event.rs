//! Ingestion event types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::stores::StoreKind;

/// Overall result of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    /// Every record parsed, persisted and cached.
    Success,
    /// Persisted, but some records were dropped or the cache path degraded.
    Partial,
    /// Fetch or parse failed, or the batch was lost.
    Failure,
}

impl std::fmt::Display for TickStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Partial => write!(f, "partial"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Structured events emitted by ingestion jobs.
///
/// Every variant carries the emission time and the id of the job that
/// produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IngestEvent {
    /// A tick ran to completion (successfully or not).
    TickFinished {
        at: DateTime<Utc>,
        job_id: String,
        status: TickStatus,
        records: usize,
        dropped: usize,
        persisted: bool,
        cache_updated: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    /// A trigger fired while the previous tick was still in flight.
    TickSkipped { at: DateTime<Utc>, job_id: String },

    /// The parser left a record out of the batch.
    RecordDropped {
        at: DateTime<Utc>,
        job_id: String,
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        symbol: Option<String>,
        reason: String,
    },

    /// A store went from available to unavailable or back.
    StoreAvailabilityChanged {
        at: DateTime<Utc>,
        job_id: String,
        store: StoreKind,
        available: bool,
    },

    /// Durable retries were exhausted and the batch was not persisted.
    BatchLost {
        at: DateTime<Utc>,
        job_id: String,
        records: usize,
        attempts: u32,
        error: String,
    },
}

impl IngestEvent {
    pub fn tick_skipped(job_id: impl Into<String>) -> Self {
        Self::TickSkipped {
            at: Utc::now(),
            job_id: job_id.into(),
        }
    }

    pub fn record_dropped(
        job_id: impl Into<String>,
        index: usize,
        symbol: Option<String>,
        reason: impl ToString,
    ) -> Self {
        Self::RecordDropped {
            at: Utc::now(),
            job_id: job_id.into(),
            index,
            symbol,
            reason: reason.to_string(),
        }
    }

    pub fn store_availability_changed(
        job_id: impl Into<String>,
        store: StoreKind,
        available: bool,
    ) -> Self {
        Self::StoreAvailabilityChanged {
            at: Utc::now(),
            job_id: job_id.into(),
            store,
            available,
        }
    }

    pub fn batch_lost(
        job_id: impl Into<String>,
        records: usize,
        attempts: u32,
        error: impl Into<String>,
    ) -> Self {
        Self::BatchLost {
            at: Utc::now(),
            job_id: job_id.into(),
            records,
            attempts,
            error: error.into(),
        }
    }

    /// Short machine-readable name of the event kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TickFinished { .. } => "tick_finished",
            Self::TickSkipped { .. } => "tick_skipped",
            Self::RecordDropped { .. } => "record_dropped",
            Self::StoreAvailabilityChanged { .. } => "store_availability_changed",
            Self::BatchLost { .. } => "batch_lost",
        }
    }

    pub fn job_id(&self) -> &str {
        match self {
            Self::TickFinished { job_id, .. }
            | Self::TickSkipped { job_id, .. }
            | Self::RecordDropped { job_id, .. }
            | Self::StoreAvailabilityChanged { job_id, .. }
            | Self::BatchLost { job_id, .. } => job_id,
        }
    }

    pub fn at(&self) -> DateTime<Utc> {
        match self {
            Self::TickFinished { at, .. }
            | Self::TickSkipped { at, .. }
            | Self::RecordDropped { at, .. }
            | Self::StoreAvailabilityChanged { at, .. }
            | Self::BatchLost { at, .. } => *at,
        }
    }
}
