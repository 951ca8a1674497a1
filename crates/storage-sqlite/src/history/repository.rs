use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::SqliteConnection;
use log::{debug, warn};
use quotefeed_core::stores::ConnectionStateCell;
use quotefeed_core::{ConnectionState, DurableStore, Error, HistoryBatch, HistoryRecord, Result};

use super::model::QuoteHistoryDB;
use crate::db::{DbPool, WriteHandle};
use crate::errors::{IntoCore, StorageError};
use crate::schema::quote_history::dsl as history_dsl;

// 22 bound columns per row stays well under SQLite's variable limit.
const INSERT_CHUNK: usize = 500;

/// [`DurableStore`] over the `quote_history` table.
///
/// Inserts go through the shared writer actor; liveness probes check out a
/// pooled connection on the blocking pool.
pub struct SqliteDurableStore {
    pool: Arc<DbPool>,
    writer: WriteHandle,
    probe_timeout: Duration,
    state: ConnectionStateCell,
}

impl SqliteDurableStore {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle, probe_timeout: Duration) -> Self {
        Self {
            pool,
            writer,
            probe_timeout,
            state: ConnectionStateCell::new(ConnectionState::Connecting),
        }
    }

    fn record_state(&self, next: ConnectionState) {
        let previous = self.state.set(next);
        if previous != next {
            debug!("SQLite store: {} -> {}", previous, next);
        }
    }

    /// Most recent history rows for a symbol, newest first.
    pub async fn history_for_symbol(&self, symbol: &str, limit: i64) -> Result<Vec<HistoryRecord>> {
        let pool = Arc::clone(&self.pool);
        let symbol = symbol.trim().to_uppercase();

        tokio::task::spawn_blocking(move || -> Result<Vec<HistoryRecord>> {
            let mut conn = pool.get().into_core()?;
            let rows = history_dsl::quote_history
                .filter(history_dsl::symbol.eq(symbol))
                .order((history_dsl::fetched_at.desc(), history_dsl::id.desc()))
                .limit(limit)
                .select(QuoteHistoryDB::as_select())
                .load::<QuoteHistoryDB>(&mut conn)
                .into_core()?;
            Ok(rows.into_iter().map(HistoryRecord::from).collect())
        })
        .await
        .map_err(|e| Error::Unexpected(format!("history query task failed: {}", e)))?
    }

    /// Number of rows written by a job.
    pub async fn count_for_job(&self, job_id: &str) -> Result<i64> {
        let pool = Arc::clone(&self.pool);
        let job_id = job_id.to_string();

        tokio::task::spawn_blocking(move || -> Result<i64> {
            let mut conn = pool.get().into_core()?;
            history_dsl::quote_history
                .filter(history_dsl::job_id.eq(job_id))
                .count()
                .get_result(&mut conn)
                .into_core()
        })
        .await
        .map_err(|e| Error::Unexpected(format!("history query task failed: {}", e)))?
    }
}

#[async_trait]
impl DurableStore for SqliteDurableStore {
    async fn write_batch(&self, batch: &HistoryBatch) -> Result<usize> {
        if batch.is_empty() {
            return Ok(0);
        }
        let rows = QuoteHistoryDB::from_batch(batch, Utc::now());

        let result = self
            .writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut written = 0;
                for chunk in rows.chunks(INSERT_CHUNK) {
                    written += diesel::insert_into(history_dsl::quote_history)
                        .values(chunk)
                        .execute(conn)
                        .map_err(StorageError::QueryFailed)?;
                }
                Ok(written)
            })
            .await;

        match result {
            Ok(written) => {
                self.record_state(ConnectionState::Connected);
                debug!(
                    "Persisted {} history rows for job '{}'",
                    written, batch.job_id
                );
                Ok(written)
            }
            Err(e) => {
                self.record_state(ConnectionState::Degraded);
                warn!("History write for job '{}' failed: {}", batch.job_id, e);
                Err(Error::DurableWrite(e.to_string()))
            }
        }
    }

    async fn is_available(&self) -> bool {
        let pool = Arc::clone(&self.pool);
        let checkout = self.probe_timeout;

        let probe = tokio::task::spawn_blocking(move || -> Result<()> {
            let mut conn = pool.get_timeout(checkout).into_core()?;
            diesel::sql_query("SELECT 1").execute(&mut conn).into_core()?;
            Ok(())
        });

        let available = matches!(
            tokio::time::timeout(self.probe_timeout, probe).await,
            Ok(Ok(Ok(())))
        );
        if available {
            // A probe does not clear a failed write.
            if self.state.get() != ConnectionState::Degraded {
                self.record_state(ConnectionState::Connected);
            }
        } else {
            self.record_state(ConnectionState::Disconnected);
        }
        available
    }

    fn connection_state(&self) -> ConnectionState {
        self.state.get()
    }
}
