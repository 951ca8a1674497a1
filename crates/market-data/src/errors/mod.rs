//! Error types and stage classification for the market data crate.
//!
//! This module provides:
//! - [`MarketDataError`]: The error enum for fetch and parse operations
//! - [`FailureStage`]: Which pipeline stage an error belongs to

mod stage;

pub use stage::FailureStage;

use thiserror::Error;

/// Errors that can occur while fetching or parsing quote payloads.
///
/// None of these are retried inside this crate. The ingestion scheduler
/// decides what to do with them based on [`stage`](Self::stage).
#[derive(Error, Debug)]
pub enum MarketDataError {
    /// Transport-level failure or a non-success response from the provider.
    #[error("Provider error: {provider} - {message}")]
    Provider {
        /// The provider that returned the error
        provider: String,
        /// The error message from the provider
        message: String,
    },

    /// The provider rejected our credentials or session.
    #[error("Authentication rejected: {provider} - {message}")]
    Auth {
        /// The provider that rejected the request
        provider: String,
        /// Detail from the rejection
        message: String,
    },

    /// No response arrived within the fetch window.
    #[error("Timeout: {provider}")]
    Timeout {
        /// The provider that timed out
        provider: String,
    },

    /// The payload could not be decoded at all (not JSON, truncated, ...).
    #[error("Malformed payload: {0}")]
    MalformedPayload(String),

    /// The payload decoded but a mandatory envelope field is absent.
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A symbol set was empty or contained only blank entries.
    #[error("Invalid symbol set: {0}")]
    InvalidSymbolSet(String),

    /// A network error occurred while communicating with a provider.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

impl MarketDataError {
    /// Returns the pipeline stage this error belongs to.
    ///
    /// # Examples
    ///
    /// ```
    /// use quotefeed_market_data::errors::{FailureStage, MarketDataError};
    ///
    /// let error = MarketDataError::Timeout { provider: "YAHOO".to_string() };
    /// assert_eq!(error.stage(), FailureStage::Fetch);
    ///
    /// let error = MarketDataError::SchemaMismatch("missing quoteResponse".to_string());
    /// assert_eq!(error.stage(), FailureStage::Parse);
    /// ```
    pub fn stage(&self) -> FailureStage {
        match self {
            Self::Provider { .. } | Self::Auth { .. } | Self::Timeout { .. } | Self::Network(_) => {
                FailureStage::Fetch
            }
            Self::MalformedPayload(_) | Self::SchemaMismatch(_) => FailureStage::Parse,
            Self::InvalidSymbolSet(_) => FailureStage::Config,
        }
    }

    /// Maps a reqwest error onto the fetch-stage taxonomy.
    pub fn from_transport(provider: &str, error: reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                provider: provider.to_string(),
            }
        } else {
            Self::Provider {
                provider: provider.to_string(),
                message: error.to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_error_is_fetch_stage() {
        let error = MarketDataError::Provider {
            provider: "YAHOO".to_string(),
            message: "HTTP 502".to_string(),
        };
        assert_eq!(error.stage(), FailureStage::Fetch);
    }

    #[test]
    fn test_auth_error_is_fetch_stage() {
        let error = MarketDataError::Auth {
            provider: "YAHOO".to_string(),
            message: "HTTP 401".to_string(),
        };
        assert_eq!(error.stage(), FailureStage::Fetch);
    }

    #[test]
    fn test_timeout_is_fetch_stage() {
        let error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(error.stage(), FailureStage::Fetch);
    }

    #[test]
    fn test_malformed_payload_is_parse_stage() {
        let error = MarketDataError::MalformedPayload("expected value at line 1".to_string());
        assert_eq!(error.stage(), FailureStage::Parse);
    }

    #[test]
    fn test_schema_mismatch_is_parse_stage() {
        let error = MarketDataError::SchemaMismatch("missing result".to_string());
        assert_eq!(error.stage(), FailureStage::Parse);
    }

    #[test]
    fn test_invalid_symbol_set_is_config_stage() {
        let error = MarketDataError::InvalidSymbolSet("empty".to_string());
        assert_eq!(error.stage(), FailureStage::Config);
    }

    #[test]
    fn test_error_display() {
        let error = MarketDataError::Timeout {
            provider: "YAHOO".to_string(),
        };
        assert_eq!(format!("{}", error), "Timeout: YAHOO");

        let error = MarketDataError::Auth {
            provider: "YAHOO".to_string(),
            message: "HTTP 401".to_string(),
        };
        assert_eq!(
            format!("{}", error),
            "Authentication rejected: YAHOO - HTTP 401"
        );

        let error = MarketDataError::MalformedPayload("eof".to_string());
        assert_eq!(format!("{}", error), "Malformed payload: eof");
    }
}
