//! Periodic driver for ingestion jobs.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, error, info, warn};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::config::IngestConfig;
use super::job::{IngestionContext, IngestionJob};
use crate::errors::Result;

/// Owns one [`IngestionJob`] per configured symbol set and triggers each on a
/// fixed interval.
///
/// Jobs share the stores in the [`IngestionContext`] but nothing else; a slow
/// job never delays another one.
pub struct IngestionScheduler {
    jobs: Vec<Arc<IngestionJob>>,
    poll_interval: Duration,
    shutdown_tx: watch::Sender<bool>,
    drivers: Mutex<Vec<JoinHandle<()>>>,
}

impl IngestionScheduler {
    /// Validate the configuration and build every job. Nothing runs until
    /// [`start`](Self::start).
    pub fn new(config: &IngestConfig, ctx: IngestionContext) -> Result<Self> {
        config.validate()?;

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let jobs = config
            .jobs
            .iter()
            .cloned()
            .map(|job| Arc::new(IngestionJob::new(job, config, ctx.clone(), shutdown_rx.clone())))
            .collect();

        Ok(Self {
            jobs,
            poll_interval: config.poll_interval,
            shutdown_tx,
            drivers: Mutex::new(Vec::new()),
        })
    }

    pub fn jobs(&self) -> &[Arc<IngestionJob>] {
        &self.jobs
    }

    pub fn job(&self, id: &str) -> Option<&Arc<IngestionJob>> {
        self.jobs.iter().find(|job| job.id() == id)
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.shutdown_tx.borrow()
    }

    /// Spawn one driver task per job. The first tick fires immediately.
    ///
    /// Must be called from within a Tokio runtime. Calling it twice is a no-op.
    pub fn start(&self) {
        let mut drivers = self.drivers.lock().unwrap_or_else(|p| p.into_inner());
        if !drivers.is_empty() {
            warn!("Ingestion scheduler already started");
            return;
        }
        if self.is_shutting_down() {
            warn!("Ingestion scheduler is shut down, not starting");
            return;
        }

        info!(
            "Starting ingestion scheduler: {} job(s), interval {:?}",
            self.jobs.len(),
            self.poll_interval
        );
        for job in &self.jobs {
            drivers.push(tokio::spawn(drive(
                Arc::clone(job),
                self.poll_interval,
                self.shutdown_tx.subscribe(),
            )));
        }
    }

    /// Stop triggering ticks and wait for in-flight ticks to finish.
    pub async fn shutdown(&self) {
        info!("Shutting down ingestion scheduler");
        self.shutdown_tx.send_replace(true);

        let drivers = std::mem::take(&mut *self.drivers.lock().unwrap_or_else(|p| p.into_inner()));
        for driver in drivers {
            if let Err(e) = driver.await {
                error!("Ingestion driver task failed: {}", e);
            }
        }
        info!("Ingestion scheduler stopped");
    }
}

/// Trigger `job` every `interval` until shutdown.
///
/// Each tick runs on its own task so the timer keeps its cadence when a tick
/// overruns; the job's single-flight guard turns the overlapping trigger into
/// a skip.
async fn drive(job: Arc<IngestionJob>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut ticks: Vec<JoinHandle<()>> = Vec::new();

    debug!("[{}] Driver started for {}", job.id(), job.symbols());
    loop {
        tokio::select! {
            biased;
            _ = shutdown.wait_for(|stop| *stop) => break,
            _ = ticker.tick() => {
                ticks.retain(|handle| !handle.is_finished());
                let job = Arc::clone(&job);
                ticks.push(tokio::spawn(async move {
                    job.run_tick().await;
                }));
            }
        }
    }

    for tick in ticks {
        if let Err(e) = tick.await {
            error!("[{}] Tick task failed: {}", job.id(), e);
        }
    }
    debug!("[{}] Driver stopped", job.id());
}
