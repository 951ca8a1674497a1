use std::time::Duration;

/// Default poll cadence per job
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Default bound on one provider fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

/// Default bound on a store liveness probe
pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Durable writes: attempts per tick before the batch is reported lost
pub const DEFAULT_DURABLE_ATTEMPTS: u32 = 3;

/// Durable writes: delay after the first failed attempt
pub const DEFAULT_DURABLE_INITIAL_BACKOFF: Duration = Duration::from_secs(1);

/// Durable writes: growth factor between consecutive delays (1s, 4s, 16s)
pub const DEFAULT_DURABLE_BACKOFF_MULTIPLIER: u32 = 4;

/// Job id used when a single unnamed symbol set is configured
pub const DEFAULT_JOB_ID: &str = "default";
