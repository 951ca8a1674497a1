//! Database model for quote history rows.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use quotefeed_core::{HistoryBatch, HistoryRecord};
use quotefeed_market_data::Quote;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One quote of one tick, as stored.
///
/// Decimals are stored as text so they round-trip exactly.
#[derive(Queryable, Selectable, Insertable, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[diesel(table_name = crate::schema::quote_history)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
#[serde(rename_all = "camelCase")]
pub struct QuoteHistoryDB {
    pub id: String,
    pub job_id: String,
    pub symbol: String,
    pub quote_type: String,
    pub display_name: Option<String>,
    pub ask: String,
    pub bid: String,
    pub regular_market_price: String,
    pub regular_market_open: String,
    pub regular_market_previous_close: String,
    pub regular_market_change: String,
    pub regular_market_change_percent: String,
    pub regular_market_time: i64,
    pub pre_market_price: String,
    pub pre_market_change: String,
    pub dividends_per_share: String,
    pub earnings_timestamp: i64,
    pub fifty_day_average: String,
    pub two_hundred_day_average: String,
    /// NULL when the delta was unknown
    pub price_delta: Option<String>,
    pub fetched_at: String,
    pub created_at: String,
}

impl QuoteHistoryDB {
    /// Rows for every record of a batch, each with a fresh time-ordered id.
    pub fn from_batch(batch: &HistoryBatch, created_at: DateTime<Utc>) -> Vec<Self> {
        let fetched_at = batch.fetched_at.to_rfc3339();
        let created_at = created_at.to_rfc3339();
        batch
            .records
            .iter()
            .map(|record| Self::from_record(&batch.job_id, record, &fetched_at, &created_at))
            .collect()
    }

    fn from_record(job_id: &str, record: &HistoryRecord, fetched_at: &str, created_at: &str) -> Self {
        let quote = &record.quote;
        Self {
            id: uuid::Uuid::now_v7().to_string(),
            job_id: job_id.to_string(),
            symbol: quote.symbol.clone(),
            quote_type: quote.quote_type.clone(),
            display_name: quote.display_name.clone(),
            ask: quote.ask.to_string(),
            bid: quote.bid.to_string(),
            regular_market_price: quote.regular_market_price.to_string(),
            regular_market_open: quote.regular_market_open.to_string(),
            regular_market_previous_close: quote.regular_market_previous_close.to_string(),
            regular_market_change: quote.regular_market_change.to_string(),
            regular_market_change_percent: quote.regular_market_change_percent.to_string(),
            regular_market_time: quote.regular_market_time,
            pre_market_price: quote.pre_market_price.to_string(),
            pre_market_change: quote.pre_market_change.to_string(),
            dividends_per_share: quote.dividends_per_share.to_string(),
            earnings_timestamp: quote.earnings_timestamp,
            fifty_day_average: quote.fifty_day_average.to_string(),
            two_hundred_day_average: quote.two_hundred_day_average.to_string(),
            price_delta: record.delta.map(|d| d.to_string()),
            fetched_at: fetched_at.to_string(),
            created_at: created_at.to_string(),
        }
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(&self.fetched_at)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or_else(|_| Utc::now())
    }
}

impl From<QuoteHistoryDB> for HistoryRecord {
    fn from(db: QuoteHistoryDB) -> Self {
        let decimal = |s: &str| Decimal::from_str(s).unwrap_or_default();

        HistoryRecord {
            quote: Quote {
                symbol: db.symbol,
                quote_type: db.quote_type,
                display_name: db.display_name,
                ask: decimal(&db.ask),
                bid: decimal(&db.bid),
                regular_market_price: decimal(&db.regular_market_price),
                regular_market_open: decimal(&db.regular_market_open),
                regular_market_previous_close: decimal(&db.regular_market_previous_close),
                regular_market_change: decimal(&db.regular_market_change),
                regular_market_change_percent: decimal(&db.regular_market_change_percent),
                regular_market_time: db.regular_market_time,
                pre_market_price: decimal(&db.pre_market_price),
                pre_market_change: decimal(&db.pre_market_change),
                dividends_per_share: decimal(&db.dividends_per_share),
                earnings_timestamp: db.earnings_timestamp,
                fifty_day_average: decimal(&db.fifty_day_average),
                two_hundred_day_average: decimal(&db.two_hundred_day_average),
            },
            delta: db.price_delta.as_deref().and_then(|s| Decimal::from_str(s).ok()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rows_keep_unknown_delta_as_null() {
        let batch = HistoryBatch {
            job_id: "tech".to_string(),
            fetched_at: Utc::now(),
            records: vec![
                HistoryRecord {
                    quote: Quote::new("MSFT", dec!(305.50), 1_700_000_000),
                    delta: Some(dec!(5.50)),
                },
                HistoryRecord {
                    quote: Quote::new("AAPL", dec!(149.25), 1_700_000_000),
                    delta: None,
                },
            ],
        };

        let rows = QuoteHistoryDB::from_batch(&batch, Utc::now());
        assert_eq!(rows.len(), 2);
        assert_ne!(rows[0].id, rows[1].id);
        assert_eq!(rows[0].price_delta.as_deref(), Some("5.50"));
        assert_eq!(rows[1].price_delta, None);
        assert_eq!(rows[0].regular_market_price, "305.50");

        let back: HistoryRecord = rows[0].clone().into();
        assert_eq!(back, batch.records[0]);
    }
}
