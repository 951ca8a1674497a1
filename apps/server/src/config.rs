use std::str::FromStr;
use std::time::Duration;

use quotefeed_core::constants::{
    DEFAULT_DURABLE_ATTEMPTS, DEFAULT_DURABLE_BACKOFF_MULTIPLIER, DEFAULT_DURABLE_INITIAL_BACKOFF,
    DEFAULT_FETCH_TIMEOUT, DEFAULT_JOB_ID, DEFAULT_POLL_INTERVAL, DEFAULT_PROBE_TIMEOUT,
};
use quotefeed_core::errors::ConfigError;
use quotefeed_core::{IngestConfig, JobConfig, RetryPolicy};
use quotefeed_market_data::SymbolSet;

const SYMBOL_SETS_KEY: &str = "QF_SYMBOL_SETS";

pub struct Config {
    pub jobs: Vec<JobConfig>,
    pub poll_interval: Duration,
    pub fetch_timeout: Duration,
    pub probe_timeout: Duration,
    pub retry: RetryPolicy,
    pub db_path: String,
    pub redis_url: String,
    pub cache_key_prefix: String,
    /// `None` means the public Yahoo host
    pub provider_base_url: Option<String>,
    pub log_format: String,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values are errors, not defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let jobs = match var(SYMBOL_SETS_KEY) {
            Some(raw) => parse_symbol_sets(&raw)?,
            None => return Err(ConfigError::EmptySymbolSet),
        };

        let poll_interval = match var("QF_POLL_INTERVAL_SECS") {
            Some(raw) => Duration::from_secs(parse_number("QF_POLL_INTERVAL_SECS", &raw)?),
            None => DEFAULT_POLL_INTERVAL,
        };
        let fetch_timeout = match var("QF_FETCH_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_number("QF_FETCH_TIMEOUT_MS", &raw)?),
            None => DEFAULT_FETCH_TIMEOUT,
        };
        let probe_timeout = match var("QF_PROBE_TIMEOUT_MS") {
            Some(raw) => Duration::from_millis(parse_number("QF_PROBE_TIMEOUT_MS", &raw)?),
            None => DEFAULT_PROBE_TIMEOUT,
        };

        let retry = RetryPolicy {
            max_attempts: match var("QF_DURABLE_RETRY_ATTEMPTS") {
                Some(raw) => parse_number("QF_DURABLE_RETRY_ATTEMPTS", &raw)?,
                None => DEFAULT_DURABLE_ATTEMPTS,
            },
            initial_backoff: match var("QF_DURABLE_BACKOFF_MS") {
                Some(raw) => Duration::from_millis(parse_number("QF_DURABLE_BACKOFF_MS", &raw)?),
                None => DEFAULT_DURABLE_INITIAL_BACKOFF,
            },
            multiplier: match var("QF_DURABLE_BACKOFF_MULTIPLIER") {
                Some(raw) => parse_number("QF_DURABLE_BACKOFF_MULTIPLIER", &raw)?,
                None => DEFAULT_DURABLE_BACKOFF_MULTIPLIER,
            },
        };

        let config = Self {
            jobs,
            poll_interval,
            fetch_timeout,
            probe_timeout,
            retry,
            db_path: var("QF_DB_PATH").unwrap_or_else(|| "./db/quotefeed.db".into()),
            redis_url: var("QF_REDIS_URL").unwrap_or_else(|| "redis://127.0.0.1:6379".into()),
            cache_key_prefix: var("QF_CACHE_KEY_PREFIX").unwrap_or_else(|| "quote:".into()),
            provider_base_url: var("QF_PROVIDER_BASE_URL"),
            log_format: var("QF_LOG_FORMAT").unwrap_or_else(|| "text".into()),
        };
        config.ingest_config().validate()?;
        Ok(config)
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            jobs: self.jobs.clone(),
            poll_interval: self.poll_interval,
            fetch_timeout: self.fetch_timeout,
            probe_timeout: self.probe_timeout,
            retry: self.retry.clone(),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    raw.parse().map_err(|e: T::Err| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("'{}': {}", raw, e),
    })
}

/// `tech=MSFT,AAPL;energy=XOM` or a bare `MSFT,AAPL` for a single default job.
fn parse_symbol_sets(raw: &str) -> Result<Vec<JobConfig>, ConfigError> {
    raw.split(';')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            let (id, list) = match part.split_once('=') {
                Some((id, list)) => (id.trim(), list),
                None => (DEFAULT_JOB_ID, part),
            };
            let symbols = SymbolSet::parse(list).map_err(|e| ConfigError::InvalidValue {
                key: SYMBOL_SETS_KEY.to_string(),
                message: format!("job '{}': {}", id, e),
            })?;
            Ok(JobConfig::new(id, symbols))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[("QF_SYMBOL_SETS", "msft, aapl")]).unwrap();
        assert_eq!(config.jobs.len(), 1);
        assert_eq!(config.jobs[0].id, "default");
        assert_eq!(config.jobs[0].symbols.as_slice(), ["MSFT", "AAPL"]);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.probe_timeout, Duration::from_secs(2));
        assert_eq!(config.retry, RetryPolicy::default());
        assert_eq!(config.db_path, "./db/quotefeed.db");
        assert_eq!(config.cache_key_prefix, "quote:");
        assert!(config.provider_base_url.is_none());
    }

    #[test]
    fn test_named_symbol_sets() {
        let config = config(&[
            ("QF_SYMBOL_SETS", "tech=MSFT,AAPL; energy=XOM;"),
            ("QF_POLL_INTERVAL_SECS", "60"),
            ("QF_DURABLE_BACKOFF_MS", "250"),
        ])
        .unwrap();
        let ids: Vec<&str> = config.jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, ["tech", "energy"]);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(
            config.ingest_config().retry.schedule(),
            vec![
                Duration::from_millis(250),
                Duration::from_millis(1000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[test]
    fn test_missing_symbols_is_fatal() {
        assert_eq!(config(&[]).err(), Some(ConfigError::EmptySymbolSet));
        assert_eq!(
            config(&[("QF_SYMBOL_SETS", "  ")]).err(),
            Some(ConfigError::EmptySymbolSet)
        );
    }

    #[test]
    fn test_unparseable_number_is_an_error() {
        let err = config(&[
            ("QF_SYMBOL_SETS", "MSFT"),
            ("QF_POLL_INTERVAL_SECS", "thirty"),
        ])
        .err()
        .unwrap();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "QF_POLL_INTERVAL_SECS"));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = config(&[("QF_SYMBOL_SETS", "MSFT"), ("QF_POLL_INTERVAL_SECS", "0")])
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::InvalidInterval);
    }

    #[test]
    fn test_duplicate_job_is_rejected() {
        let err = config(&[("QF_SYMBOL_SETS", "tech=MSFT;tech=AAPL")])
            .err()
            .unwrap();
        assert_eq!(err, ConfigError::DuplicateJob("tech".to_string()));
    }
}
