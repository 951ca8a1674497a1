use std::time::Duration;

/// Initial delay between reconnection attempts.
pub const DEFAULT_RECONNECT_INITIAL: Duration = Duration::from_millis(500);

/// Reconnection delay cap.
pub const DEFAULT_RECONNECT_MAX: Duration = Duration::from_secs(30);

pub const DEFAULT_KEY_PREFIX: &str = "quote:";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedisCacheConfig {
    pub url: String,
    /// Prepended to the symbol to form the key (`quote:MSFT`)
    pub key_prefix: String,
    /// Bound on connecting and on every command
    pub op_timeout: Duration,
    pub reconnect_initial: Duration,
    pub reconnect_max: Duration,
}

impl RedisCacheConfig {
    pub fn new(url: impl Into<String>, op_timeout: Duration) -> Self {
        Self {
            url: url.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            op_timeout,
            reconnect_initial: DEFAULT_RECONNECT_INITIAL,
            reconnect_max: DEFAULT_RECONNECT_MAX,
        }
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn key(&self, symbol: &str) -> String {
        format!("{}{}", self.key_prefix, symbol)
    }

    /// Delay following `current` in the reconnection schedule.
    pub fn next_backoff(&self, current: Duration) -> Duration {
        current.saturating_mul(2).min(self.reconnect_max)
    }
}
