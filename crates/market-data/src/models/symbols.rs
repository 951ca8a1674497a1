use serde::{Deserialize, Serialize};

use crate::errors::MarketDataError;

/// The symbols one ingestion job polls.
///
/// Entries are trimmed, uppercased and de-duplicated while keeping first-seen
/// order. A set is never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct SymbolSet(Vec<String>);

impl SymbolSet {
    /// Build a set from any list of symbol-like strings.
    pub fn new<I, S>(symbols: I) -> Result<Self, MarketDataError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for raw in symbols {
            let symbol = raw.as_ref().trim().to_uppercase();
            if symbol.is_empty() || normalized.contains(&symbol) {
                continue;
            }
            normalized.push(symbol);
        }

        if normalized.is_empty() {
            return Err(MarketDataError::InvalidSymbolSet(
                "at least one non-blank symbol is required".to_string(),
            ));
        }
        Ok(Self(normalized))
    }

    /// Parse a comma-separated list such as `"msft, aapl"`.
    pub fn parse(list: &str) -> Result<Self, MarketDataError> {
        Self::new(list.split(','))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false; kept for API symmetry with collections.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.0.iter().any(|s| s == symbol)
    }

    /// Comma-joined form used in provider requests and log lines.
    pub fn joined(&self) -> String {
        self.0.join(",")
    }
}

impl TryFrom<Vec<String>> for SymbolSet {
    type Error = MarketDataError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<SymbolSet> for Vec<String> {
    fn from(value: SymbolSet) -> Self {
        value.0
    }
}

impl<'a> IntoIterator for &'a SymbolSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl std::fmt::Display for SymbolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.joined())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalizes_and_dedupes() {
        let set = SymbolSet::new(["msft", " AAPL ", "Msft", ""]).unwrap();
        assert_eq!(set.as_slice(), &["MSFT".to_string(), "AAPL".to_string()]);
        assert!(set.contains("AAPL"));
        assert_eq!(set.joined(), "MSFT,AAPL");
    }

    #[test]
    fn test_parse_comma_list() {
        let set = SymbolSet::parse("btc-usd, eth-usd,,").unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set.to_string(), "BTC-USD,ETH-USD");
    }

    #[test]
    fn test_empty_set_rejected() {
        assert!(matches!(
            SymbolSet::parse(" , ,"),
            Err(MarketDataError::InvalidSymbolSet(_))
        ));
        assert!(SymbolSet::new(Vec::<String>::new()).is_err());
    }

    #[test]
    fn test_deserialize_validates() {
        let set: SymbolSet = serde_json::from_str(r#"["msft","aapl"]"#).unwrap();
        assert_eq!(set.len(), 2);
        assert!(serde_json::from_str::<SymbolSet>("[]").is_err());
    }
}
