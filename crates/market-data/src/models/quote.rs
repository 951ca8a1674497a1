use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Quote type assumed when the provider omits it.
pub const DEFAULT_QUOTE_TYPE: &str = "EQUITY";

/// One symbol's market snapshot at a point in time.
///
/// Built by a [`QuoteParser`](crate::parser::QuoteParser) from a single provider
/// record and never mutated afterwards. Stores serialize copies of it; decimals
/// serialize as strings so a cached snapshot round-trips exactly.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Uppercase ticker, natural key within a batch
    pub symbol: String,

    /// Provider instrument class (EQUITY, ETF, CRYPTOCURRENCY, ...)
    pub quote_type: String,

    /// Human-readable name
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub display_name: Option<String>,

    pub ask: Decimal,
    pub bid: Decimal,

    /// Last regular-session price (required)
    pub regular_market_price: Decimal,
    pub regular_market_open: Decimal,
    pub regular_market_previous_close: Decimal,
    pub regular_market_change: Decimal,
    pub regular_market_change_percent: Decimal,

    /// Epoch seconds of the regular-session price (required, > 0)
    pub regular_market_time: i64,

    /// 0 when the provider has no pre-market data
    pub pre_market_price: Decimal,
    pub pre_market_change: Decimal,

    pub dividends_per_share: Decimal,

    /// Epoch seconds, 0 if unknown
    pub earnings_timestamp: i64,

    pub fifty_day_average: Decimal,
    pub two_hundred_day_average: Decimal,
}

impl Quote {
    /// Create a quote with only the mandatory fields set; everything optional
    /// takes its documented default.
    pub fn new(symbol: impl Into<String>, regular_market_price: Decimal, regular_market_time: i64) -> Self {
        Self {
            symbol: symbol.into().trim().to_uppercase(),
            quote_type: DEFAULT_QUOTE_TYPE.to_string(),
            display_name: None,
            ask: Decimal::ZERO,
            bid: Decimal::ZERO,
            regular_market_price,
            regular_market_open: Decimal::ZERO,
            regular_market_previous_close: Decimal::ZERO,
            regular_market_change: Decimal::ZERO,
            regular_market_change_percent: Decimal::ZERO,
            regular_market_time,
            pre_market_price: Decimal::ZERO,
            pre_market_change: Decimal::ZERO,
            dividends_per_share: Decimal::ZERO,
            earnings_timestamp: 0,
            fifty_day_average: Decimal::ZERO,
            two_hundred_day_average: Decimal::ZERO,
        }
    }

    /// Regular-market timestamp as a UTC datetime.
    pub fn regular_market_datetime(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_opt(self.regular_market_time, 0).single()
    }

    /// Earnings timestamp as a UTC datetime, `None` when unknown.
    pub fn earnings_datetime(&self) -> Option<DateTime<Utc>> {
        if self.earnings_timestamp <= 0 {
            return None;
        }
        Utc.timestamp_opt(self.earnings_timestamp, 0).single()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quote_new_defaults() {
        let quote = Quote::new(" msft ", dec!(300.00), 1_700_000_000);
        assert_eq!(quote.symbol, "MSFT");
        assert_eq!(quote.quote_type, "EQUITY");
        assert_eq!(quote.regular_market_price, dec!(300.00));
        assert_eq!(quote.pre_market_price, Decimal::ZERO);
        assert_eq!(quote.earnings_timestamp, 0);
        assert!(quote.display_name.is_none());
        assert!(quote.earnings_datetime().is_none());
    }

    #[test]
    fn test_quote_json_keeps_decimal_precision() {
        let mut quote = Quote::new("AAPL", dec!(149.25), 1_700_000_000);
        quote.regular_market_change_percent = dec!(-0.4975124378109453);

        let json = serde_json::to_string(&quote).unwrap();
        assert!(json.contains("\"regularMarketPrice\":\"149.25\""));

        let back: Quote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, quote);
    }

    #[test]
    fn test_regular_market_datetime() {
        let quote = Quote::new("AAPL", dec!(1), 1_700_000_000);
        let dt = quote.regular_market_datetime().unwrap();
        assert_eq!(dt.timestamp(), 1_700_000_000);
    }
}
