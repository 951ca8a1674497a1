use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::quote::Quote;
use super::types::ProviderId;

/// Opaque provider response for one fetch.
#[derive(Clone, Debug)]
pub struct RawPayload {
    /// Body exactly as received
    pub bytes: Vec<u8>,

    /// When the fetch completed; becomes the batch timestamp
    pub fetched_at: DateTime<Utc>,

    /// Provider that produced the bytes
    pub provider: ProviderId,
}

impl RawPayload {
    pub fn new(bytes: impl Into<Vec<u8>>, fetched_at: DateTime<Utc>, provider: ProviderId) -> Self {
        Self {
            bytes: bytes.into(),
            fetched_at,
            provider,
        }
    }
}

/// Quotes produced by one fetch cycle.
///
/// Holds at most one quote per symbol. Lives only for the duration of a tick.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteBatch {
    pub fetched_at: DateTime<Utc>,
    pub quotes: Vec<Quote>,
}

impl QuoteBatch {
    pub fn new(fetched_at: DateTime<Utc>, quotes: Vec<Quote>) -> Self {
        Self { fetched_at, quotes }
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    pub fn get(&self, symbol: &str) -> Option<&Quote> {
        self.quotes.iter().find(|q| q.symbol == symbol)
    }

    pub fn symbols(&self) -> Vec<String> {
        self.quotes.iter().map(|q| q.symbol.clone()).collect()
    }
}

/// Why a provider record was left out of a batch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropReason {
    /// A mandatory field (symbol, regularMarketPrice, regularMarketTime) is absent.
    MissingField { field: String },

    /// A field is present but outside its allowed range.
    InvalidField { field: String, message: String },

    /// Another record in the same payload already supplied this symbol.
    DuplicateSymbol,
}

impl std::fmt::Display for DropReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingField { field } => write!(f, "missing mandatory field '{}'", field),
            Self::InvalidField { field, message } => {
                write!(f, "invalid field '{}': {}", field, message)
            }
            Self::DuplicateSymbol => write!(f, "duplicate symbol in payload"),
        }
    }
}

/// A record the parser skipped. Non-fatal; reported as a warning.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DroppedRecord {
    /// Position of the record in the provider's result array
    pub index: usize,

    /// Symbol, when the record had a usable one
    pub symbol: Option<String>,

    pub reason: DropReason,
}

/// Result of a successful parse: the usable batch plus whatever was dropped.
#[derive(Clone, Debug)]
pub struct ParsedBatch {
    pub batch: QuoteBatch,
    pub dropped: Vec<DroppedRecord>,
}

impl ParsedBatch {
    pub fn is_partial(&self) -> bool {
        !self.dropped.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_batch_lookup() {
        let batch = QuoteBatch::new(
            Utc::now(),
            vec![
                Quote::new("MSFT", dec!(300), 1_700_000_000),
                Quote::new("AAPL", dec!(150), 1_700_000_000),
            ],
        );
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.get("AAPL").unwrap().regular_market_price, dec!(150));
        assert!(batch.get("GOOG").is_none());
        assert_eq!(batch.symbols(), vec!["MSFT".to_string(), "AAPL".to_string()]);
    }

    #[test]
    fn test_drop_reason_display() {
        let reason = DropReason::MissingField {
            field: "regularMarketPrice".to_string(),
        };
        assert_eq!(
            reason.to_string(),
            "missing mandatory field 'regularMarketPrice'"
        );
        assert_eq!(
            DropReason::DuplicateSymbol.to_string(),
            "duplicate symbol in payload"
        );
    }
}
