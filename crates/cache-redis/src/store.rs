//! Redis-backed [`CacheStore`].
//!
//! Connection lifecycle:
//!
//! ```text
//! Disconnected -> Connecting -> Connected --(command fails)--> Degraded
//!      ^                           ^                              |
//!      |                           +------(command succeeds)------+
//!      +----(second consecutive failure, or an I/O error)---------+
//! ```
//!
//! Entering `Disconnected` wakes the supervisor task, which reconnects on a
//! capped exponential backoff. Commands never wait for it.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use log::{debug, info, warn};
use quotefeed_core::errors::ConfigError;
use quotefeed_core::stores::ConnectionStateCell;
use quotefeed_core::{CacheStore, ConnectionState, Error, Result};
use quotefeed_market_data::{Quote, QuoteBatch};
use redis::aio::MultiplexedConnection;
use redis::{RedisError, RedisResult};
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::config::RedisCacheConfig;

/// Consecutive command failures that drop a degraded connection.
const FAILURES_BEFORE_DISCONNECT: u32 = 2;

struct Inner {
    client: redis::Client,
    config: RedisCacheConfig,
    conn: Mutex<Option<MultiplexedConnection>>,
    state: ConnectionStateCell,
    failures: AtomicU32,
    /// Serializes connection attempts between `reconnect()` and the supervisor.
    connecting: tokio::sync::Mutex<()>,
    wake: Notify,
}

impl Inner {
    fn conn(&self) -> MutexGuard<'_, Option<MultiplexedConnection>> {
        self.conn.lock().unwrap_or_else(|p| p.into_inner())
    }

    fn set_state(&self, next: ConnectionState) {
        let previous = self.state.set(next);
        if previous != next {
            debug!("Redis cache: {} -> {}", previous, next);
        }
    }

    async fn connect(&self) -> Result<()> {
        let _attempt = self.connecting.lock().await;
        if self.state.get() == ConnectionState::Connected && self.conn().is_some() {
            return Ok(());
        }

        self.set_state(ConnectionState::Connecting);
        let timeout = self.config.op_timeout;
        let attempt = async {
            let mut conn = self.client.get_multiplexed_async_connection().await?;
            let _: String = redis::cmd("PING").query_async(&mut conn).await?;
            RedisResult::Ok(conn)
        };

        match tokio::time::timeout(timeout, attempt).await {
            Ok(Ok(conn)) => {
                *self.conn() = Some(conn);
                self.failures.store(0, Ordering::Release);
                self.set_state(ConnectionState::Connected);
                info!("Connected to Redis cache");
                Ok(())
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Disconnected);
                Err(Error::CacheUnavailable(format!("connect failed: {}", e)))
            }
            Err(_) => {
                self.set_state(ConnectionState::Disconnected);
                Err(Error::CacheUnavailable(format!(
                    "connect timed out after {:?}",
                    timeout
                )))
            }
        }
    }

    /// A clone of the live connection, without waiting.
    fn connection(&self) -> Result<MultiplexedConnection> {
        match self.state.get() {
            ConnectionState::Connected | ConnectionState::Degraded => self
                .conn()
                .clone()
                .ok_or_else(|| Error::CacheUnavailable("not connected".to_string())),
            state => Err(Error::CacheUnavailable(format!("connection is {}", state))),
        }
    }

    fn record_success(&self) {
        self.failures.store(0, Ordering::Release);
        if self
            .state
            .transition(ConnectionState::Degraded, ConnectionState::Connected)
        {
            info!("Redis cache recovered");
        }
    }

    fn record_failure(&self, io: bool) {
        let failures = self.failures.fetch_add(1, Ordering::AcqRel) + 1;
        if io || failures >= FAILURES_BEFORE_DISCONNECT {
            self.disconnect();
        } else if self
            .state
            .transition(ConnectionState::Connected, ConnectionState::Degraded)
        {
            warn!("Redis cache degraded");
        }
    }

    fn disconnect(&self) {
        *self.conn() = None;
        let previous = self.state.set(ConnectionState::Disconnected);
        if previous != ConnectionState::Disconnected {
            warn!("Redis cache disconnected, reconnecting in background");
        }
        self.wake.notify_one();
    }

    /// Run one command against the current connection, bounded by the op timeout.
    async fn run<T, F, Fut>(&self, op: &str, command: F) -> Result<T>
    where
        F: FnOnce(MultiplexedConnection) -> Fut,
        Fut: Future<Output = RedisResult<T>>,
    {
        let conn = self.connection()?;
        match tokio::time::timeout(self.config.op_timeout, command(conn)).await {
            Ok(Ok(value)) => {
                self.record_success();
                Ok(value)
            }
            Ok(Err(e)) => {
                self.record_failure(is_connection_error(&e));
                Err(Error::CacheUnavailable(format!("{} failed: {}", op, e)))
            }
            Err(_) => {
                self.record_failure(false);
                Err(Error::CacheUnavailable(format!("{} timed out", op)))
            }
        }
    }
}

fn is_connection_error(e: &RedisError) -> bool {
    e.is_io_error() || e.is_connection_dropped() || e.is_connection_refusal()
}

/// Reconnect whenever the store drops to `Disconnected`.
async fn supervise(inner: Arc<Inner>) {
    let mut delay = inner.config.reconnect_initial;
    loop {
        if inner.state.get() == ConnectionState::Disconnected {
            match inner.connect().await {
                Ok(()) => delay = inner.config.reconnect_initial,
                Err(e) => {
                    debug!("Redis reconnect failed, next attempt in {:?}: {}", delay, e);
                    tokio::time::sleep(delay).await;
                    delay = inner.config.next_backoff(delay);
                    continue;
                }
            }
        }
        inner.wake.notified().await;
    }
}

/// Snapshot cache over Redis.
///
/// Dropping the store stops its reconnection task.
pub struct RedisCacheStore {
    inner: Arc<Inner>,
    supervisor: JoinHandle<()>,
}

impl RedisCacheStore {
    /// Open the store and attempt a first connection.
    ///
    /// An unreachable server is not an error: the store starts `Disconnected`
    /// and keeps trying in the background. Only an unparseable URL fails.
    pub async fn connect(config: RedisCacheConfig) -> Result<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|e| {
            Error::Config(ConfigError::InvalidValue {
                key: "redis url".to_string(),
                message: e.to_string(),
            })
        })?;

        let inner = Arc::new(Inner {
            client,
            config,
            conn: Mutex::new(None),
            state: ConnectionStateCell::new(ConnectionState::Disconnected),
            failures: AtomicU32::new(0),
            connecting: tokio::sync::Mutex::new(()),
            wake: Notify::new(),
        });

        if let Err(e) = inner.connect().await {
            warn!("Redis cache unavailable at startup: {}", e);
        }
        let supervisor = tokio::spawn(supervise(Arc::clone(&inner)));

        Ok(Self { inner, supervisor })
    }

    pub fn config(&self) -> &RedisCacheConfig {
        &self.inner.config
    }
}

impl Drop for RedisCacheStore {
    fn drop(&mut self) {
        self.supervisor.abort();
    }
}

fn decode(symbol: &str, raw: &str) -> Option<Quote> {
    match serde_json::from_str(raw) {
        Ok(quote) => Some(quote),
        Err(e) => {
            warn!("Ignoring undecodable snapshot for {}: {}", symbol, e);
            None
        }
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    async fn read_snapshot(&self, symbol: &str) -> Result<Option<Quote>> {
        let key = self.inner.config.key(symbol);
        let raw: Option<String> = self
            .inner
            .run("GET", |mut conn| async move {
                redis::cmd("GET").arg(key).query_async(&mut conn).await
            })
            .await?;
        Ok(raw.and_then(|raw| decode(symbol, &raw)))
    }

    async fn read_snapshots(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }
        let keys: Vec<String> = symbols.iter().map(|s| self.inner.config.key(s)).collect();
        let values: Vec<Option<String>> = self
            .inner
            .run("MGET", |mut conn| async move {
                redis::cmd("MGET").arg(keys).query_async(&mut conn).await
            })
            .await?;

        Ok(symbols
            .iter()
            .zip(values)
            .filter_map(|(symbol, raw)| {
                let quote = decode(symbol, &raw?)?;
                Some((symbol.clone(), quote))
            })
            .collect())
    }

    async fn write_snapshot(&self, batch: &QuoteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut pipe = redis::pipe();
        for quote in &batch.quotes {
            pipe.cmd("SET")
                .arg(self.inner.config.key(&quote.symbol))
                .arg(serde_json::to_string(quote)?)
                .ignore();
        }

        self.inner
            .run("SET", |mut conn| async move {
                let () = pipe.query_async(&mut conn).await?;
                Ok(())
            })
            .await
    }

    fn is_available(&self) -> bool {
        self.inner.state.get().is_available()
    }

    async fn reconnect(&self) -> Result<()> {
        if self.inner.state.get() == ConnectionState::Connected {
            return Ok(());
        }
        self.inner.connect().await
    }

    fn connection_state(&self) -> ConnectionState {
        self.inner.state.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn unreachable() -> RedisCacheConfig {
        RedisCacheConfig::new("redis://127.0.0.1:1", Duration::from_millis(500))
    }

    fn connected_inner() -> Inner {
        let config = unreachable();
        Inner {
            client: redis::Client::open(config.url.as_str()).unwrap(),
            config,
            conn: Mutex::new(None),
            state: ConnectionStateCell::new(ConnectionState::Connected),
            failures: AtomicU32::new(0),
            connecting: tokio::sync::Mutex::new(()),
            wake: Notify::new(),
        }
    }

    async fn woken(inner: &Inner) -> bool {
        tokio::time::timeout(Duration::from_millis(50), inner.wake.notified())
            .await
            .is_ok()
    }

    #[tokio::test]
    async fn test_failed_command_degrades_then_success_recovers() {
        let inner = connected_inner();

        inner.record_failure(false);
        assert_eq!(inner.state.get(), ConnectionState::Degraded);
        assert!(!inner.state.get().is_available());

        inner.record_success();
        assert_eq!(inner.state.get(), ConnectionState::Connected);
        assert_eq!(inner.failures.load(Ordering::Acquire), 0);
        assert!(!woken(&inner).await);
    }

    #[tokio::test]
    async fn test_second_consecutive_failure_disconnects_and_wakes() {
        let inner = connected_inner();

        inner.record_failure(false);
        assert_eq!(inner.state.get(), ConnectionState::Degraded);
        inner.record_failure(false);
        assert_eq!(inner.state.get(), ConnectionState::Disconnected);
        assert!(inner.conn().is_none());
        assert!(woken(&inner).await);

        // A success no longer counts once disconnected.
        inner.record_success();
        assert_eq!(inner.state.get(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_io_error_disconnects_immediately() {
        let inner = connected_inner();

        inner.record_failure(true);
        assert_eq!(inner.state.get(), ConnectionState::Disconnected);
        assert!(woken(&inner).await);
        assert!(matches!(
            inner.connection(),
            Err(Error::CacheUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_server_starts_disconnected() {
        let store = RedisCacheStore::connect(unreachable()).await.unwrap();
        assert!(!store.is_available());
        assert_ne!(store.connection_state(), ConnectionState::Connected);

        let err = store
            .read_snapshots(&["MSFT".to_string()])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::CacheUnavailable(_)));

        let err = store.read_snapshot("MSFT").await.unwrap_err();
        assert!(matches!(err, Error::CacheUnavailable(_)));

        assert!(store.reconnect().await.is_err());
    }

    #[tokio::test]
    async fn test_empty_inputs_skip_the_server() {
        let store = RedisCacheStore::connect(unreachable()).await.unwrap();
        assert!(store.read_snapshots(&[]).await.unwrap().is_empty());
        let batch = QuoteBatch::new(chrono::Utc::now(), vec![]);
        assert!(store.write_snapshot(&batch).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_is_config_error() {
        let config = RedisCacheConfig::new("not a url", Duration::from_millis(500));
        let err = RedisCacheStore::connect(config).await.err().unwrap();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_decode_ignores_garbage() {
        assert!(decode("MSFT", "{not json").is_none());
        let quote = Quote::new("MSFT", rust_decimal_macros::dec!(300), 1_700_000_000);
        let raw = serde_json::to_string(&quote).unwrap();
        assert_eq!(decode("MSFT", &raw), Some(quote));
    }
}
