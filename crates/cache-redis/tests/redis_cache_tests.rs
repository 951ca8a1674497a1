//! Tests against a live Redis server.
//!
//! Ignored by default. Run with a server available:
//!
//! ```text
//! QF_TEST_REDIS_URL=redis://127.0.0.1:6379 cargo test -p quotefeed-cache-redis -- --ignored
//! ```

use std::time::Duration;

use chrono::Utc;
use quotefeed_cache_redis::{RedisCacheConfig, RedisCacheStore};
use quotefeed_core::{CacheStore, ConnectionState};
use quotefeed_market_data::{Quote, QuoteBatch};
use rust_decimal_macros::dec;

async fn store() -> RedisCacheStore {
    let url = std::env::var("QF_TEST_REDIS_URL")
        .unwrap_or_else(|_| "redis://127.0.0.1:6379".to_string());
    let prefix = format!("qf-test:{}:", Utc::now().timestamp_nanos_opt().unwrap_or_default());
    let config = RedisCacheConfig::new(url, Duration::from_secs(2)).with_key_prefix(prefix);
    RedisCacheStore::connect(config).await.unwrap()
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_snapshot_roundtrip_overwrites_per_symbol() {
    let store = store().await;
    assert_eq!(store.connection_state(), ConnectionState::Connected);
    assert!(store.is_available());
    assert!(store.read_snapshot("MSFT").await.unwrap().is_none());

    let mut msft = Quote::new("MSFT", dec!(300.00), 1_700_000_000);
    msft.display_name = Some("Microsoft Corporation".to_string());
    let first = QuoteBatch::new(
        Utc::now(),
        vec![msft, Quote::new("AAPL", dec!(150.00), 1_700_000_000)],
    );
    store.write_snapshot(&first).await.unwrap();

    let second = QuoteBatch::new(
        Utc::now(),
        vec![Quote::new("MSFT", dec!(305.50), 1_700_000_030)],
    );
    store.write_snapshot(&second).await.unwrap();

    let snapshots = store
        .read_snapshots(&["MSFT".to_string(), "AAPL".to_string(), "GOOG".to_string()])
        .await
        .unwrap();
    assert_eq!(snapshots.len(), 2);
    assert_eq!(snapshots["MSFT"], second.quotes[0]);
    assert_eq!(snapshots["AAPL"].regular_market_price, dec!(150.00));
    assert!(!snapshots.contains_key("GOOG"));
}

#[tokio::test]
#[ignore = "requires a running Redis server"]
async fn test_reconnect_is_noop_when_connected() {
    let store = store().await;
    store.reconnect().await.unwrap();
    store.reconnect().await.unwrap();
    assert_eq!(store.connection_state(), ConnectionState::Connected);
}
