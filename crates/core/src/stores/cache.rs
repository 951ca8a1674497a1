//! Cache store trait.

use std::collections::HashMap;

use async_trait::async_trait;
use quotefeed_market_data::{Quote, QuoteBatch};

use super::ConnectionState;
use crate::errors::Result;

/// Ephemeral key/value store holding the latest snapshot per symbol.
///
/// # Contract
///
/// - `read_snapshot` returns `Ok(None)` for a symbol never written
/// - `write_snapshot` overwrites per symbol; updates across symbols are not atomic
/// - `is_available` is a cheap, non-blocking probe that never fails
/// - `reconnect` is idempotent and safe to call from anywhere
///
/// Failures surface as [`Error::CacheUnavailable`](crate::Error::CacheUnavailable).
/// Losing the cache never loses data; it only costs delta fidelity.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Last known quote for a symbol.
    async fn read_snapshot(&self, symbol: &str) -> Result<Option<Quote>>;

    /// Last known quotes for several symbols. Missing symbols are absent from the map.
    ///
    /// Default implementation calls `read_snapshot()` for each symbol.
    async fn read_snapshots(&self, symbols: &[String]) -> Result<HashMap<String, Quote>> {
        let mut snapshots = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(quote) = self.read_snapshot(symbol).await? {
                snapshots.insert(symbol.clone(), quote);
            }
        }
        Ok(snapshots)
    }

    /// Replace the snapshot of every symbol in the batch.
    async fn write_snapshot(&self, batch: &QuoteBatch) -> Result<()>;

    /// Whether the cache can currently serve requests.
    fn is_available(&self) -> bool;

    /// Attempt to (re)establish the connection now.
    async fn reconnect(&self) -> Result<()>;

    fn connection_state(&self) -> ConnectionState;
}
