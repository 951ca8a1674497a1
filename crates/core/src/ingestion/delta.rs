use std::collections::{BTreeMap, HashMap};

use quotefeed_market_data::{Quote, QuoteBatch};
use rust_decimal::Decimal;

/// Per-symbol price change; `None` means unknown.
pub type Deltas = BTreeMap<String, Option<Decimal>>;

/// Price change of every quote in `batch` against the prior snapshots.
///
/// `prior == None` means the cache could not be consulted this tick, so every
/// delta is unknown. A symbol with no prior snapshot is unknown as well.
pub fn compute_deltas(batch: &QuoteBatch, prior: Option<&HashMap<String, Quote>>) -> Deltas {
    batch
        .quotes
        .iter()
        .map(|quote| {
            let delta = prior
                .and_then(|snapshots| snapshots.get(&quote.symbol))
                .map(|previous| quote.regular_market_price - previous.regular_market_price);
            (quote.symbol.clone(), delta)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn batch(prices: &[(&str, Decimal)]) -> QuoteBatch {
        QuoteBatch::new(
            Utc::now(),
            prices
                .iter()
                .map(|(s, p)| Quote::new(*s, *p, 1_700_000_000))
                .collect(),
        )
    }

    #[test]
    fn test_delta_against_prior() {
        let previous = batch(&[("MSFT", dec!(300.00)), ("AAPL", dec!(150.00))]);
        let prior: HashMap<String, Quote> = previous
            .quotes
            .into_iter()
            .map(|q| (q.symbol.clone(), q))
            .collect();

        let current = batch(&[("MSFT", dec!(305.50)), ("AAPL", dec!(149.25)), ("GOOG", dec!(140))]);
        let deltas = compute_deltas(&current, Some(&prior));

        assert_eq!(deltas["MSFT"], Some(dec!(5.50)));
        assert_eq!(deltas["AAPL"], Some(dec!(-0.75)));
        assert_eq!(deltas["GOOG"], None);
    }

    #[test]
    fn test_unavailable_cache_means_unknown() {
        let current = batch(&[("MSFT", dec!(305.50))]);
        let deltas = compute_deltas(&current, None);
        assert_eq!(deltas["MSFT"], None);
    }

    #[test]
    fn test_unchanged_price_is_zero_not_unknown() {
        let previous = batch(&[("MSFT", dec!(300))]);
        let prior: HashMap<String, Quote> = previous
            .quotes
            .into_iter()
            .map(|q| (q.symbol.clone(), q))
            .collect();
        let deltas = compute_deltas(&batch(&[("MSFT", dec!(300))]), Some(&prior));
        assert_eq!(deltas["MSFT"], Some(Decimal::ZERO));
    }
}
