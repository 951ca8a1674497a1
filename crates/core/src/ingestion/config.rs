//! Typed configuration consumed by the pipeline.

use std::collections::HashSet;
use std::time::Duration;

use quotefeed_market_data::SymbolSet;
use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_DURABLE_ATTEMPTS, DEFAULT_DURABLE_BACKOFF_MULTIPLIER, DEFAULT_DURABLE_INITIAL_BACKOFF,
    DEFAULT_FETCH_TIMEOUT, DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_TIMEOUT,
};
use crate::errors::ConfigError;

/// Bounded exponential retry for durable writes.
///
/// With the defaults the delays are 1s, 4s, 16s: the delay after failed
/// attempt `n` is `initial_backoff * multiplier^(n-1)`. No delay follows the
/// final attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub multiplier: u32,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_DURABLE_ATTEMPTS,
            initial_backoff: DEFAULT_DURABLE_INITIAL_BACKOFF,
            multiplier: DEFAULT_DURABLE_BACKOFF_MULTIPLIER,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt `attempt` (1-based).
    pub fn backoff_after(&self, attempt: u32) -> Duration {
        if self.initial_backoff.is_zero() {
            return Duration::ZERO;
        }
        let exponent = attempt.saturating_sub(1);
        self.multiplier
            .checked_pow(exponent)
            .and_then(|factor| self.initial_backoff.checked_mul(factor))
            .unwrap_or(Duration::MAX)
    }

    /// The full backoff schedule, one entry per attempt.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..=self.max_attempts).map(|a| self.backoff_after(a)).collect()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidRetryPolicy(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        if self.multiplier == 0 {
            return Err(ConfigError::InvalidRetryPolicy(
                "multiplier must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One symbol set polled as an independent job.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobConfig {
    pub id: String,
    pub symbols: SymbolSet,
}

impl JobConfig {
    pub fn new(id: impl Into<String>, symbols: SymbolSet) -> Self {
        Self {
            id: id.into(),
            symbols,
        }
    }
}

/// Everything the scheduler needs to run.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestConfig {
    pub jobs: Vec<JobConfig>,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    pub retry: RetryPolicy,
}

impl IngestConfig {
    /// Config with default timings for the given jobs.
    pub fn with_jobs(jobs: Vec<JobConfig>) -> Self {
        Self {
            jobs,
            poll_interval: DEFAULT_POLL_INTERVAL,
            fetch_timeout: DEFAULT_FETCH_TIMEOUT,
            probe_timeout: DEFAULT_PROBE_TIMEOUT,
            retry: RetryPolicy::default(),
        }
    }

    /// Reject configurations the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jobs.is_empty() {
            return Err(ConfigError::EmptySymbolSet);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::InvalidInterval);
        }
        if self.fetch_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("fetch_timeout"));
        }
        if self.probe_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout("probe_timeout"));
        }
        self.retry.validate()?;

        let mut seen = HashSet::new();
        for job in &self.jobs {
            if job.id.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    key: "job id".to_string(),
                    message: "must not be blank".to_string(),
                });
            }
            if job.symbols.is_empty() {
                return Err(ConfigError::EmptySymbolSet);
            }
            if !seen.insert(job.id.as_str()) {
                return Err(ConfigError::DuplicateJob(job.id.clone()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job(id: &str, symbols: &str) -> JobConfig {
        JobConfig::new(id, SymbolSet::parse(symbols).unwrap())
    }

    #[test]
    fn test_default_backoff_schedule() {
        let policy = RetryPolicy::default();
        assert_eq!(
            policy.schedule(),
            vec![
                Duration::from_secs(1),
                Duration::from_secs(4),
                Duration::from_secs(16)
            ]
        );
        assert_eq!(policy.backoff_after(2), Duration::from_secs(4));
    }

    #[test]
    fn test_backoff_saturates() {
        let policy = RetryPolicy {
            max_attempts: 100,
            initial_backoff: Duration::from_secs(1),
            multiplier: 10,
        };
        assert_eq!(policy.backoff_after(100), Duration::MAX);
        // 10^9 still fits the factor, 10^10 does not
        assert_eq!(policy.backoff_after(10), Duration::from_secs(1_000_000_000));
        assert_eq!(policy.backoff_after(11), Duration::MAX);
    }

    #[test]
    fn test_valid_config() {
        let config = IngestConfig::with_jobs(vec![job("tech", "MSFT,AAPL"), job("energy", "XOM")]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_jobs_rejected() {
        let config = IngestConfig::with_jobs(vec![]);
        assert_eq!(config.validate(), Err(ConfigError::EmptySymbolSet));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = IngestConfig::with_jobs(vec![job("tech", "MSFT")]);
        config.poll_interval = Duration::ZERO;
        assert_eq!(config.validate(), Err(ConfigError::InvalidInterval));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let mut config = IngestConfig::with_jobs(vec![job("tech", "MSFT")]);
        config.probe_timeout = Duration::ZERO;
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidTimeout("probe_timeout"))
        );
    }

    #[test]
    fn test_zero_attempts_rejected() {
        let mut config = IngestConfig::with_jobs(vec![job("tech", "MSFT")]);
        config.retry.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidRetryPolicy(_))
        ));
    }

    #[test]
    fn test_duplicate_job_rejected() {
        let config = IngestConfig::with_jobs(vec![job("tech", "MSFT"), job("tech", "AAPL")]);
        assert_eq!(
            config.validate(),
            Err(ConfigError::DuplicateJob("tech".to_string()))
        );
    }
}
