//! Parser for the Yahoo Finance v7 quote payload.

use std::collections::HashMap;

use num_traits::FromPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use super::QuoteParser;
use crate::errors::MarketDataError;
use crate::models::{
    DropReason, DroppedRecord, ParsedBatch, Quote, QuoteBatch, RawPayload, DEFAULT_QUOTE_TYPE,
};
use crate::provider::yahoo::models::{YahooNumber, YahooQuoteEnvelope, YahooQuoteRecord};

/// Parser for `/v7/finance/quote` responses.
#[derive(Clone, Copy, Debug, Default)]
pub struct YahooQuoteParser;

impl YahooQuoteParser {
    pub fn new() -> Self {
        Self
    }
}

impl QuoteParser for YahooQuoteParser {
    fn parse(&self, payload: &RawPayload) -> Result<ParsedBatch, MarketDataError> {
        let envelope: YahooQuoteEnvelope = serde_json::from_slice(&payload.bytes)
            .map_err(|e| MarketDataError::MalformedPayload(e.to_string()))?;

        let response = envelope.quote_response.ok_or_else(|| {
            MarketDataError::SchemaMismatch("missing 'quoteResponse'".to_string())
        })?;

        let records = match (response.result, response.error) {
            (Some(records), _) => records,
            (None, Some(error)) if !error.is_null() => {
                return Err(MarketDataError::SchemaMismatch(format!(
                    "provider returned an error instead of results: {}",
                    error
                )));
            }
            (None, _) => {
                return Err(MarketDataError::SchemaMismatch(
                    "missing 'quoteResponse.result'".to_string(),
                ));
            }
        };

        let mut kept: Vec<(usize, Quote)> = Vec::with_capacity(records.len());
        let mut positions: HashMap<String, usize> = HashMap::new();
        let mut dropped: Vec<DroppedRecord> = Vec::new();

        for (index, value) in records.into_iter().enumerate() {
            let quote = match serde_json::from_value::<YahooQuoteRecord>(value) {
                Ok(record) => convert_record(record),
                Err(e) => Err((
                    None,
                    DropReason::InvalidField {
                        field: "record".to_string(),
                        message: e.to_string(),
                    },
                )),
            };

            let quote = match quote {
                Ok(quote) => quote,
                Err((symbol, reason)) => {
                    debug!("Dropping Yahoo record #{}: {}", index, reason);
                    dropped.push(DroppedRecord {
                        index,
                        symbol,
                        reason,
                    });
                    continue;
                }
            };

            match positions.get(&quote.symbol) {
                None => {
                    positions.insert(quote.symbol.clone(), kept.len());
                    kept.push((index, quote));
                }
                Some(&position) => {
                    let (existing_index, existing) = &kept[position];
                    if supersedes(&quote, existing) {
                        dropped.push(DroppedRecord {
                            index: *existing_index,
                            symbol: Some(existing.symbol.clone()),
                            reason: DropReason::DuplicateSymbol,
                        });
                        kept[position] = (index, quote);
                    } else {
                        dropped.push(DroppedRecord {
                            index,
                            symbol: Some(quote.symbol),
                            reason: DropReason::DuplicateSymbol,
                        });
                    }
                }
            }
        }

        dropped.sort_by_key(|d| d.index);

        Ok(ParsedBatch {
            batch: QuoteBatch::new(
                payload.fetched_at,
                kept.into_iter().map(|(_, quote)| quote).collect(),
            ),
            dropped,
        })
    }
}

/// Decides which of two records for the same symbol survives.
///
/// Newer regular-market time wins. Ties fall back to comparing every other
/// field so the outcome never depends on record order.
fn supersedes(candidate: &Quote, existing: &Quote) -> bool {
    let (c, e) = (candidate, existing);
    c.regular_market_time
        .cmp(&e.regular_market_time)
        .then_with(|| c.regular_market_price.cmp(&e.regular_market_price))
        .then_with(|| c.ask.cmp(&e.ask))
        .then_with(|| c.bid.cmp(&e.bid))
        .then_with(|| c.regular_market_open.cmp(&e.regular_market_open))
        .then_with(|| c.regular_market_previous_close.cmp(&e.regular_market_previous_close))
        .then_with(|| c.regular_market_change.cmp(&e.regular_market_change))
        .then_with(|| c.regular_market_change_percent.cmp(&e.regular_market_change_percent))
        .then_with(|| c.pre_market_price.cmp(&e.pre_market_price))
        .then_with(|| c.pre_market_change.cmp(&e.pre_market_change))
        .then_with(|| c.dividends_per_share.cmp(&e.dividends_per_share))
        .then_with(|| c.earnings_timestamp.cmp(&e.earnings_timestamp))
        .then_with(|| c.fifty_day_average.cmp(&e.fifty_day_average))
        .then_with(|| c.two_hundred_day_average.cmp(&e.two_hundred_day_average))
        .then_with(|| c.quote_type.cmp(&e.quote_type))
        .then_with(|| c.display_name.cmp(&e.display_name))
        .is_gt()
}

type RecordError = (Option<String>, DropReason);

fn missing(symbol: &Option<String>, field: &str) -> RecordError {
    (
        symbol.clone(),
        DropReason::MissingField {
            field: field.to_string(),
        },
    )
}

fn invalid(symbol: &Option<String>, field: &str, message: impl Into<String>) -> RecordError {
    (
        symbol.clone(),
        DropReason::InvalidField {
            field: field.to_string(),
            message: message.into(),
        },
    )
}

/// Map one provider record onto a [`Quote`], applying the documented defaults.
fn convert_record(record: YahooQuoteRecord) -> Result<Quote, RecordError> {
    let symbol = record
        .symbol
        .as_deref()
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty());
    if symbol.is_none() {
        return Err(missing(&None, "symbol"));
    }

    let price = match record.regular_market_price.as_ref().and_then(YahooNumber::value) {
        Some(v) => to_decimal(&symbol, "regularMarketPrice", v)?,
        None => return Err(missing(&symbol, "regularMarketPrice")),
    };
    non_negative(&symbol, "regularMarketPrice", price)?;

    let time = match record.regular_market_time.as_ref().and_then(YahooNumber::value) {
        Some(v) => to_timestamp(&symbol, "regularMarketTime", v)?,
        None => return Err(missing(&symbol, "regularMarketTime")),
    };
    if time <= 0 {
        return Err(invalid(&symbol, "regularMarketTime", "must be positive"));
    }

    let ask = optional(&symbol, "ask", &record.ask, true)?;
    let bid = optional(&symbol, "bid", &record.bid, true)?;
    let open = optional(&symbol, "regularMarketOpen", &record.regular_market_open, true)?;
    let previous_close = optional(
        &symbol,
        "regularMarketPreviousClose",
        &record.regular_market_previous_close,
        true,
    )?;
    let change = optional(&symbol, "regularMarketChange", &record.regular_market_change, false)?;
    let change_percent = optional(
        &symbol,
        "regularMarketChangePercent",
        &record.regular_market_change_percent,
        false,
    )?;
    let pre_market_price = optional(&symbol, "preMarketPrice", &record.pre_market_price, false)?;
    let pre_market_change = optional(&symbol, "preMarketChange", &record.pre_market_change, false)?;
    let dividends = match record.dividends() {
        Some(v) => to_decimal(&symbol, "dividendsPerShare", v)?,
        None => Decimal::ZERO,
    };
    non_negative(&symbol, "dividendsPerShare", dividends)?;
    let fifty_day = optional(&symbol, "fiftyDayAverage", &record.fifty_day_average, true)?;
    let two_hundred_day = optional(
        &symbol,
        "twoHundredDayAverage",
        &record.two_hundred_day_average,
        true,
    )?;

    // Unknown or nonsensical earnings dates collapse to 0 rather than dropping the record.
    let earnings_timestamp = record
        .earnings_timestamp
        .as_ref()
        .and_then(YahooNumber::value)
        .filter(|v| v.is_finite() && *v > 0.0 && *v <= i64::MAX as f64)
        .map(|v| v as i64)
        .unwrap_or(0);

    let quote_type = record
        .quote_type
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_uppercase)
        .unwrap_or_else(|| DEFAULT_QUOTE_TYPE.to_string());

    let display_name = record.name();

    Ok(Quote {
        symbol: symbol.unwrap_or_default(),
        quote_type,
        display_name,
        ask,
        bid,
        regular_market_price: price,
        regular_market_open: open,
        regular_market_previous_close: previous_close,
        regular_market_change: change,
        regular_market_change_percent: change_percent,
        regular_market_time: time,
        pre_market_price,
        pre_market_change,
        dividends_per_share: dividends,
        earnings_timestamp,
        fifty_day_average: fifty_day,
        two_hundred_day_average: two_hundred_day,
    })
}

/// Optional numeric field: absent resolves to 0.
fn optional(
    symbol: &Option<String>,
    field: &str,
    value: &Option<YahooNumber>,
    must_be_non_negative: bool,
) -> Result<Decimal, RecordError> {
    let decimal = match value.as_ref().and_then(YahooNumber::value) {
        Some(v) => to_decimal(symbol, field, v)?,
        None => return Ok(Decimal::ZERO),
    };
    if must_be_non_negative {
        non_negative(symbol, field, decimal)?;
    }
    Ok(decimal)
}

fn to_decimal(symbol: &Option<String>, field: &str, value: f64) -> Result<Decimal, RecordError> {
    // from_f64 picks the shortest decimal that round-trips, so 305.5 stays 305.5
    Decimal::from_f64(value)
        .map(|d| d.normalize())
        .ok_or_else(|| invalid(symbol, field, format!("{} is not representable", value)))
}

fn to_timestamp(symbol: &Option<String>, field: &str, value: f64) -> Result<i64, RecordError> {
    if !value.is_finite() || value.fract() != 0.0 || value.abs() > i64::MAX as f64 {
        return Err(invalid(symbol, field, format!("{} is not an epoch second", value)));
    }
    Ok(value as i64)
}

fn non_negative(symbol: &Option<String>, field: &str, value: Decimal) -> Result<(), RecordError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(invalid(symbol, field, format!("{} is negative", value)));
    }
    Ok(())
}
