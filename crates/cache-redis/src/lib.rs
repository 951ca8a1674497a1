//! Redis snapshot cache for quotefeed.
//!
//! Implements [`CacheStore`](quotefeed_core::CacheStore): one key per symbol
//! holding the last cached quote as JSON. The store owns its connection and
//! reconnects on its own schedule; callers only ever see a cheap availability
//! flag and fast failures.

mod config;
mod store;

pub use config::RedisCacheConfig;
pub use store::RedisCacheStore;
