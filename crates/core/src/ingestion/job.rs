//! One symbol set's fetch-parse-persist cycle.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use quotefeed_market_data::{
    MarketDataError, ParsedBatch, QuoteBatch, QuoteParser, QuoteSource, RawPayload, SymbolSet,
};
use tokio::sync::watch;

use super::availability::AvailabilityTracker;
use super::config::{IngestConfig, JobConfig, RetryPolicy};
use super::delta::{compute_deltas, Deltas};
use super::outcome::{PersistOutcome, TickOutcome, TickReport};
use super::state::JobState;
use crate::events::{IngestEvent, IngestEventSink};
use crate::stores::{CacheStore, DurableStore, HistoryBatch, HistoryRecord, StoreKind};

/// Collaborators shared by every job of a scheduler.
#[derive(Clone)]
pub struct IngestionContext {
    pub source: Arc<dyn QuoteSource>,
    pub parser: Arc<dyn QuoteParser>,
    pub cache: Arc<dyn CacheStore>,
    pub durable: Arc<dyn DurableStore>,
    pub events: Arc<dyn IngestEventSink>,
    pub availability: Arc<AvailabilityTracker>,
}

impl IngestionContext {
    pub fn new(
        source: Arc<dyn QuoteSource>,
        parser: Arc<dyn QuoteParser>,
        cache: Arc<dyn CacheStore>,
        durable: Arc<dyn DurableStore>,
        events: Arc<dyn IngestEventSink>,
    ) -> Self {
        Self {
            source,
            parser,
            cache,
            durable,
            events,
            availability: Arc::new(AvailabilityTracker::new()),
        }
    }
}

/// Clears the in-flight flag when the tick ends, however it ends.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn try_acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs ticks for one symbol set.
///
/// At most one tick is in flight at a time; a trigger that arrives while a
/// tick is running returns [`TickOutcome::Skipped`] immediately.
pub struct IngestionJob {
    id: String,
    symbols: SymbolSet,
    ctx: IngestionContext,
    retry: RetryPolicy,
    fetch_timeout: Duration,
    probe_timeout: Duration,
    in_flight: AtomicBool,
    state: Mutex<JobState>,
    shutdown: watch::Receiver<bool>,
}

impl IngestionJob {
    pub fn new(
        job: JobConfig,
        config: &IngestConfig,
        ctx: IngestionContext,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            id: job.id,
            symbols: job.symbols,
            ctx,
            retry: config.retry.clone(),
            fetch_timeout: config.fetch_timeout,
            probe_timeout: config.probe_timeout,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(JobState::Idle),
            shutdown,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn symbols(&self) -> &SymbolSet {
        &self.symbols
    }

    pub fn state(&self) -> JobState {
        *self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_state(&self, state: JobState) {
        *self.state.lock().unwrap_or_else(|p| p.into_inner()) = state;
    }

    /// Run one fetch-parse-persist cycle.
    ///
    /// Never returns an error: every failure is folded into the outcome and
    /// reported through the event sink.
    pub async fn run_tick(&self) -> TickOutcome {
        let Some(_guard) = InFlightGuard::try_acquire(&self.in_flight) else {
            debug!("[{}] Previous tick still running, skipping", self.id);
            self.ctx.events.emit(IngestEvent::tick_skipped(&self.id));
            return TickOutcome::Skipped;
        };

        let outcome = self.execute().await;

        if let Some(event) = outcome.finished_event(&self.id) {
            self.ctx.events.emit(event);
        }
        self.set_state(JobState::Idle);
        outcome
    }

    async fn execute(&self) -> TickOutcome {
        self.set_state(JobState::Fetching);
        let payload = match self.fetch().await {
            Ok(payload) => payload,
            Err(e) => return self.fail(e),
        };

        self.set_state(JobState::Parsing);
        let ParsedBatch { batch, dropped } = match self.ctx.parser.parse(&payload) {
            Ok(parsed) => parsed,
            Err(e) => return self.fail(e),
        };
        for record in &dropped {
            warn!(
                "[{}] Dropped record #{} ({}): {}",
                self.id,
                record.index,
                record.symbol.as_deref().unwrap_or("?"),
                record.reason
            );
            self.ctx.events.emit(IngestEvent::record_dropped(
                &self.id,
                record.index,
                record.symbol.clone(),
                &record.reason,
            ));
        }

        self.set_state(JobState::Persisting);
        let mut cache_errors = Vec::new();
        let (deltas, read_error) = self.deltas(&batch).await;
        let cache_available = read_error.is_none();
        cache_errors.extend(read_error);

        let durable_available = self.probe_durable().await;
        self.observe(StoreKind::Durable, durable_available);
        if !durable_available {
            warn!("[{}] Durable store is not answering, writing anyway", self.id);
        }

        let (persist, cache_updated) = if batch.is_empty() {
            debug!("[{}] Empty batch, nothing to persist", self.id);
            (PersistOutcome::Written { attempts: 0, rows: 0 }, true)
        } else {
            let history = HistoryBatch {
                job_id: self.id.clone(),
                fetched_at: batch.fetched_at,
                records: batch
                    .quotes
                    .iter()
                    .map(|quote| HistoryRecord {
                        quote: quote.clone(),
                        delta: deltas.get(&quote.symbol).copied().flatten(),
                    })
                    .collect(),
            };
            let persist = self.persist(&history).await;
            if let PersistOutcome::Lost { attempts, error } = &persist {
                error!(
                    "[{}] Batch of {} quotes lost after {} attempt(s): {}",
                    self.id,
                    history.len(),
                    attempts,
                    error
                );
                self.ctx.events.emit(IngestEvent::batch_lost(
                    &self.id,
                    history.len(),
                    *attempts,
                    error.clone(),
                ));
            }

            // Runs whatever the durable outcome was.
            let cache_update = self.update_cache(&batch).await;
            let cache_updated = cache_update.is_ok();
            cache_errors.extend(cache_update.err());
            (persist, cache_updated)
        };

        let report = TickReport {
            fetched_at: batch.fetched_at,
            records: batch.len(),
            dropped,
            deltas,
            persist,
            cache_available,
            cache_updated,
            cache_errors,
        };
        info!(
            "[{}] Tick finished: {} ({} quotes, {} dropped)",
            self.id,
            report.status(),
            report.records,
            report.dropped.len()
        );
        TickOutcome::Completed(report)
    }

    async fn fetch(&self) -> Result<RawPayload, MarketDataError> {
        match tokio::time::timeout(self.fetch_timeout, self.ctx.source.fetch(&self.symbols)).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout {
                provider: self.ctx.source.id().to_string(),
            }),
        }
    }

    fn fail(&self, error: MarketDataError) -> TickOutcome {
        let stage = error.stage();
        self.set_state(JobState::Failed);
        warn!("[{}] Tick failed at {} stage: {}", self.id, stage, error);
        TickOutcome::Failed { stage, error }
    }

    /// Deltas against the cached snapshots, plus why the cache could not be
    /// used when it could not.
    async fn deltas(&self, batch: &QuoteBatch) -> (Deltas, Option<String>) {
        let available = self.ctx.cache.is_available();
        self.observe(StoreKind::Cache, available);
        if !available {
            debug!("[{}] Cache unavailable, deltas unknown this tick", self.id);
            return (
                compute_deltas(batch, None),
                Some(format!(
                    "cache unavailable ({}), deltas unknown",
                    self.ctx.cache.connection_state()
                )),
            );
        }

        let read = tokio::time::timeout(
            self.probe_timeout,
            self.ctx.cache.read_snapshots(&batch.symbols()),
        )
        .await;
        match read {
            Ok(Ok(prior)) => (compute_deltas(batch, Some(&prior)), None),
            Ok(Err(e)) => {
                warn!("[{}] Cache read failed, deltas unknown: {}", self.id, e);
                (
                    compute_deltas(batch, None),
                    Some(format!("cache read failed: {}", e)),
                )
            }
            Err(_) => {
                warn!("[{}] Cache read timed out, deltas unknown", self.id);
                (
                    compute_deltas(batch, None),
                    Some(format!("cache read timed out after {:?}", self.probe_timeout)),
                )
            }
        }
    }

    async fn probe_durable(&self) -> bool {
        tokio::time::timeout(self.probe_timeout, self.ctx.durable.is_available())
            .await
            .unwrap_or(false)
    }

    fn observe(&self, store: StoreKind, available: bool) {
        if self.ctx.availability.observe(store, available) {
            if available {
                info!("[{}] {} store is available again", self.id, store);
            } else {
                warn!("[{}] {} store became unavailable", self.id, store);
            }
            self.ctx.events.emit(IngestEvent::store_availability_changed(
                &self.id, store, available,
            ));
        }
    }

    /// Write to the durable store with bounded retries.
    async fn persist(&self, history: &HistoryBatch) -> PersistOutcome {
        let mut shutdown = self.shutdown.clone();
        let mut attempt = 0;
        loop {
            attempt += 1;
            let error = match self.ctx.durable.write_batch(history).await {
                Ok(rows) => {
                    debug!(
                        "[{}] Persisted {} rows on attempt {}",
                        self.id, rows, attempt
                    );
                    return PersistOutcome::Written {
                        attempts: attempt,
                        rows,
                    };
                }
                Err(e) => e,
            };

            if attempt >= self.retry.max_attempts {
                return PersistOutcome::Lost {
                    attempts: attempt,
                    error: error.to_string(),
                };
            }

            let delay = self.retry.backoff_after(attempt);
            warn!(
                "[{}] Durable write attempt {}/{} failed: {}. Retrying in {:?}",
                self.id, attempt, self.retry.max_attempts, error, delay
            );
            if !wait_or_shutdown(&mut shutdown, delay).await {
                return PersistOutcome::Lost {
                    attempts: attempt,
                    error: format!("shutdown during retry backoff, last error: {}", error),
                };
            }
        }
    }

    /// Best-effort snapshot update. Not retried.
    async fn update_cache(&self, batch: &QuoteBatch) -> Result<(), String> {
        match tokio::time::timeout(self.probe_timeout, self.ctx.cache.write_snapshot(batch)).await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => {
                warn!("[{}] Cache snapshot update failed: {}", self.id, e);
                Err(format!("cache update failed: {}", e))
            }
            Err(_) => {
                warn!("[{}] Cache snapshot update timed out", self.id);
                Err(format!(
                    "cache update timed out after {:?}",
                    self.probe_timeout
                ))
            }
        }
    }
}

/// Sleep for `delay` unless shutdown is requested first.
///
/// Returns `false` if shutdown won. A dropped sender can never signal
/// shutdown, so the full delay is waited in that case.
async fn wait_or_shutdown(shutdown: &mut watch::Receiver<bool>, delay: Duration) -> bool {
    let stopped = async {
        if shutdown.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    tokio::select! {
        _ = tokio::time::sleep(delay) => true,
        _ = stopped => false,
    }
}
