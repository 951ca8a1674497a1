//! Yahoo Finance v7 quote API response models.
//!
//! The envelope is decoded strictly; individual records are kept as raw JSON
//! values and decoded one by one so a single bad record cannot fail the whole
//! payload.

use serde::Deserialize;

/// Top-level response of `/v7/finance/quote`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteEnvelope {
    pub quote_response: Option<YahooQuoteResponse>,
}

/// Quote response container
#[derive(Debug, Deserialize)]
pub struct YahooQuoteResponse {
    pub result: Option<Vec<serde_json::Value>>,
    pub error: Option<serde_json::Value>,
}

/// Price detail with raw and formatted values
#[derive(Debug, Deserialize, Clone)]
pub struct YahooPriceDetail {
    pub raw: Option<f64>,
    // Note: fmt field exists but we only use raw values
}

/// Yahoo sends plain numbers on the v7 endpoint and `{"raw": .., "fmt": ..}`
/// objects on the quoteSummary endpoints. Accept both.
#[derive(Debug, Deserialize, Clone)]
#[serde(untagged)]
pub enum YahooNumber {
    Plain(f64),
    Detailed(YahooPriceDetail),
}

impl YahooNumber {
    pub fn value(&self) -> Option<f64> {
        match self {
            Self::Plain(v) => Some(*v),
            Self::Detailed(detail) => detail.raw,
        }
    }
}

/// One entry of `quoteResponse.result`.
///
/// Every field is optional here; which ones are mandatory is decided by the
/// parser, not by serde.
#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteRecord {
    pub symbol: Option<String>,
    pub quote_type: Option<String>,
    pub display_name: Option<String>,
    pub short_name: Option<String>,
    pub long_name: Option<String>,
    pub ask: Option<YahooNumber>,
    pub bid: Option<YahooNumber>,
    pub regular_market_price: Option<YahooNumber>,
    pub regular_market_open: Option<YahooNumber>,
    pub regular_market_previous_close: Option<YahooNumber>,
    pub regular_market_change: Option<YahooNumber>,
    pub regular_market_change_percent: Option<YahooNumber>,
    pub regular_market_time: Option<YahooNumber>,
    pub pre_market_price: Option<YahooNumber>,
    pub pre_market_change: Option<YahooNumber>,
    pub dividends_per_share: Option<YahooNumber>,
    pub trailing_annual_dividend_rate: Option<YahooNumber>,
    pub earnings_timestamp: Option<YahooNumber>,
    pub fifty_day_average: Option<YahooNumber>,
    pub two_hundred_day_average: Option<YahooNumber>,
}

impl YahooQuoteRecord {
    /// Preferred human-readable name.
    pub fn name(&self) -> Option<String> {
        [&self.display_name, &self.short_name, &self.long_name]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .find(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Dividends per share, falling back to the trailing annual rate.
    pub fn dividends(&self) -> Option<f64> {
        self.dividends_per_share
            .as_ref()
            .and_then(YahooNumber::value)
            .or_else(|| {
                self.trailing_annual_dividend_rate
                    .as_ref()
                    .and_then(YahooNumber::value)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_price_detail() {
        let json = r#"{"raw": 150.25, "fmt": "150.25"}"#;
        let number: YahooNumber = serde_json::from_str(json).unwrap();
        assert_eq!(number.value(), Some(150.25));
    }

    #[test]
    fn test_deserialize_plain_number() {
        let number: YahooNumber = serde_json::from_str("305.5").unwrap();
        assert_eq!(number.value(), Some(305.5));
    }

    #[test]
    fn test_deserialize_empty_detail() {
        // Yahoo returns empty objects {} for fields with no data
        let number: YahooNumber = serde_json::from_str("{}").unwrap();
        assert_eq!(number.value(), None);
    }

    #[test]
    fn test_deserialize_record() {
        let json = r#"{
            "symbol": "MSFT",
            "quoteType": "EQUITY",
            "shortName": "Microsoft Corporation",
            "regularMarketPrice": 300.0,
            "regularMarketTime": 1700000000,
            "trailingAnnualDividendRate": 2.72,
            "fiftyDayAverage": {"raw": 295.1, "fmt": "295.10"}
        }"#;
        let record: YahooQuoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.symbol.as_deref(), Some("MSFT"));
        assert_eq!(record.name().as_deref(), Some("Microsoft Corporation"));
        assert_eq!(record.dividends(), Some(2.72));
        assert_eq!(
            record.fifty_day_average.as_ref().and_then(YahooNumber::value),
            Some(295.1)
        );
        assert!(record.pre_market_price.is_none());
    }

    #[test]
    fn test_deserialize_envelope_with_error() {
        let json = r#"{"quoteResponse": {"result": null, "error": {"code": "Bad Request"}}}"#;
        let envelope: YahooQuoteEnvelope = serde_json::from_str(json).unwrap();
        let response = envelope.quote_response.unwrap();
        assert!(response.result.is_none());
        assert!(response.error.is_some());
    }
}
