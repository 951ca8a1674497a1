use std::sync::Arc;

use quotefeed_cache_redis::{RedisCacheConfig, RedisCacheStore};
use quotefeed_core::{IngestionContext, IngestionScheduler};
use quotefeed_market_data::{YahooQuoteParser, YahooQuoteSource};
use quotefeed_storage_sqlite::db::{self, spawn_writer};
use quotefeed_storage_sqlite::SqliteDurableStore;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::Config;
use crate::events::TracingEventSink;

pub fn init_tracing(log_format: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false))
            .init();
    } else {
        registry
            .with(fmt::layer().with_target(true).with_line_number(true))
            .init();
    }
}

/// Open both stores, build the Yahoo source and wire every job.
pub async fn build_scheduler(config: &Config) -> anyhow::Result<IngestionScheduler> {
    let db_path = db::init(&config.db_path)?;
    tracing::info!("Database path in use: {}", db_path);
    let pool = db::create_pool(&db_path)?;
    db::run_migrations(&pool)?;
    let writer = spawn_writer(pool.clone());
    let durable = Arc::new(SqliteDurableStore::new(pool, writer, config.probe_timeout));

    let cache_config = RedisCacheConfig::new(config.redis_url.clone(), config.probe_timeout)
        .with_key_prefix(config.cache_key_prefix.clone());
    let cache = Arc::new(RedisCacheStore::connect(cache_config).await?);

    let source = match &config.provider_base_url {
        Some(url) => YahooQuoteSource::with_base_url(url.clone(), config.fetch_timeout)?,
        None => YahooQuoteSource::new(config.fetch_timeout)?,
    };

    let ctx = IngestionContext::new(
        Arc::new(source),
        Arc::new(YahooQuoteParser::new()),
        cache,
        durable,
        Arc::new(TracingEventSink),
    );
    Ok(IngestionScheduler::new(&config.ingest_config(), ctx)?)
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
