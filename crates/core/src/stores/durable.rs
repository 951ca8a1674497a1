//! Durable store trait and the records it persists.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quotefeed_market_data::Quote;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ConnectionState;
use crate::errors::Result;

/// One quote plus its price change against the cached snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub quote: Quote,

    /// `None` means unknown (no prior snapshot or cache unavailable), never zero.
    pub delta: Option<Decimal>,
}

/// Everything one tick hands to the durable store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryBatch {
    pub job_id: String,
    pub fetched_at: DateTime<Utc>,
    pub records: Vec<HistoryRecord>,
}

impl HistoryBatch {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Append-oriented persistent store for quote history.
///
/// # Contract
///
/// - `write_batch` persists the whole batch or fails with
///   [`Error::DurableWrite`](crate::Error::DurableWrite); it does not retry
///   internally, the scheduler owns the retry policy
/// - `is_available` answers within a bounded timeout; an answer that does not
///   arrive in time counts as unavailable
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Persist a batch. Returns the number of rows written.
    async fn write_batch(&self, batch: &HistoryBatch) -> Result<usize>;

    /// Bounded liveness probe.
    async fn is_available(&self) -> bool;

    fn connection_state(&self) -> ConnectionState;
}
