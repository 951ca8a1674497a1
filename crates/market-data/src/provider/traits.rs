//! Quote source trait definition.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::{RawPayload, SymbolSet};

/// Fetches raw quote payloads from an external provider.
///
/// # Contract
///
/// - One outbound network call per invocation, no internal retries
/// - Must return within a bounded window; slow providers surface as
///   [`MarketDataError::Timeout`]
/// - Rejected credentials surface as [`MarketDataError::Auth`], every other
///   transport failure as [`MarketDataError::Provider`]
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use quotefeed_market_data::{MarketDataError, QuoteSource, RawPayload, SymbolSet};
///
/// struct FixtureSource(Vec<u8>);
///
/// #[async_trait]
/// impl QuoteSource for FixtureSource {
///     fn id(&self) -> &'static str {
///         "FIXTURE"
///     }
///
///     async fn fetch(&self, _symbols: &SymbolSet) -> Result<RawPayload, MarketDataError> {
///         Ok(RawPayload::new(self.0.clone(), chrono::Utc::now(), "FIXTURE".into()))
///     }
/// }
/// ```
#[async_trait]
pub trait QuoteSource: Send + Sync {
    /// Unique identifier for this provider, e.g. "YAHOO".
    fn id(&self) -> &'static str;

    /// Fetch the current quotes for every symbol in the set.
    async fn fetch(&self, symbols: &SymbolSet) -> Result<RawPayload, MarketDataError>;
}
