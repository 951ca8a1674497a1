//! What a single tick produced.

use chrono::{DateTime, Utc};
use quotefeed_market_data::{DroppedRecord, FailureStage, MarketDataError};

use super::delta::Deltas;
use crate::events::{IngestEvent, TickStatus};

/// Result of the durable write step.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistOutcome {
    /// The batch is in the durable store.
    Written { attempts: u32, rows: usize },
    /// Every attempt failed (or shutdown cut the retries short).
    Lost { attempts: u32, error: String },
}

impl PersistOutcome {
    pub fn is_written(&self) -> bool {
        matches!(self, Self::Written { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            Self::Written { attempts, .. } | Self::Lost { attempts, .. } => *attempts,
        }
    }
}

/// Report of a tick that got past fetch and parse.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub fetched_at: DateTime<Utc>,
    /// Quotes in the parsed batch
    pub records: usize,
    pub dropped: Vec<DroppedRecord>,
    /// Price change per symbol, `None` when unknown
    pub deltas: Deltas,
    pub persist: PersistOutcome,
    /// Whether the cache could be read for deltas this tick
    pub cache_available: bool,
    pub cache_updated: bool,
    /// Why the cache path degraded, in the order it happened
    pub cache_errors: Vec<String>,
}

impl TickReport {
    /// Error detail for the tick, if any: the lost-batch error first, then
    /// whatever degraded the cache path.
    pub fn error(&self) -> Option<String> {
        let mut details = Vec::new();
        if let PersistOutcome::Lost { error, .. } = &self.persist {
            details.push(error.clone());
        }
        details.extend(self.cache_errors.iter().cloned());
        if details.is_empty() {
            None
        } else {
            Some(details.join("; "))
        }
    }

    pub fn status(&self) -> TickStatus {
        if !self.persist.is_written() {
            TickStatus::Failure
        } else if !self.dropped.is_empty() || !self.cache_available || !self.cache_updated {
            TickStatus::Partial
        } else {
            TickStatus::Success
        }
    }
}

/// Outcome of one trigger of a job.
#[derive(Debug)]
pub enum TickOutcome {
    /// The previous tick was still running.
    Skipped,
    /// Fetch or parse failed; nothing was written.
    Failed {
        stage: FailureStage,
        error: MarketDataError,
    },
    Completed(TickReport),
}

impl TickOutcome {
    /// Status of the tick; `None` for a skipped trigger.
    pub fn status(&self) -> Option<TickStatus> {
        match self {
            Self::Skipped => None,
            Self::Failed { .. } => Some(TickStatus::Failure),
            Self::Completed(report) => Some(report.status()),
        }
    }

    pub fn report(&self) -> Option<&TickReport> {
        match self {
            Self::Completed(report) => Some(report),
            _ => None,
        }
    }

    pub fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped)
    }

    /// The `TickFinished` event describing this outcome.
    pub fn finished_event(&self, job_id: &str) -> Option<IngestEvent> {
        let status = self.status()?;
        let event = match self {
            Self::Skipped => return None,
            Self::Failed { stage, error } => IngestEvent::TickFinished {
                at: Utc::now(),
                job_id: job_id.to_string(),
                status,
                records: 0,
                dropped: 0,
                persisted: false,
                cache_updated: false,
                error: Some(format!("{} stage: {}", stage, error)),
            },
            Self::Completed(report) => IngestEvent::TickFinished {
                at: Utc::now(),
                job_id: job_id.to_string(),
                status,
                records: report.records,
                dropped: report.dropped.len(),
                persisted: report.persist.is_written(),
                cache_updated: report.cache_updated,
                error: report.error(),
            },
        };
        Some(event)
    }
}
