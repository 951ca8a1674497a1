mod config;
mod events;
mod main_lib;

use config::Config;
use main_lib::{build_scheduler, init_tracing, shutdown_signal};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing(&config.log_format);
    let scheduler = build_scheduler(&config).await?;

    scheduler.start();
    tracing::info!(
        jobs = scheduler.jobs().len(),
        interval_secs = config.poll_interval.as_secs(),
        "Quote ingestion running"
    );

    shutdown_signal().await;
    tracing::info!("Shutdown requested, waiting for in-flight ticks");
    scheduler.shutdown().await;
    Ok(())
}
