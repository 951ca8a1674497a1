//! Yahoo Finance quote source.
//!
//! Fetches the v7 `finance/quote` endpoint for a whole symbol set in one call.
//! Yahoo gates that endpoint behind a cookie + crumb session which is acquired
//! lazily and cached on the source instance.

pub mod models;

use std::borrow::Cow;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use urlencoding::encode;

use crate::errors::MarketDataError;
use crate::models::{RawPayload, SymbolSet};
use crate::provider::QuoteSource;

/// Provider identifier used in errors and payload tags.
pub const YAHOO_PROVIDER_ID: &str = "YAHOO";

/// Default query host.
pub const YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";

const YAHOO_COOKIE_URL: &str = "https://fc.yahoo.com";

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

// ============================================================================
// Crumb/Cookie Session
// ============================================================================

/// Cached Yahoo authentication data
#[derive(Debug, Clone)]
struct CrumbData {
    cookie: String,
    crumb: String,
}

// ============================================================================
// Yahoo Quote Source
// ============================================================================

/// Yahoo Finance implementation of [`QuoteSource`].
pub struct YahooQuoteSource {
    client: reqwest::Client,
    base_url: String,
    /// `false` when pointed at a custom host that does not speak the crumb protocol
    use_session: bool,
    timeout: Duration,
    session: RwLock<Option<CrumbData>>,
}

impl YahooQuoteSource {
    /// Create a source against the public Yahoo host.
    pub fn new(timeout: Duration) -> Result<Self, MarketDataError> {
        Self::build(YAHOO_BASE_URL.to_string(), true, timeout)
    }

    /// Create a source against a custom host (mirror, proxy, fixture server).
    ///
    /// No crumb session is negotiated for custom hosts.
    pub fn with_base_url(base_url: impl Into<String>, timeout: Duration) -> Result<Self, MarketDataError> {
        let base_url = base_url.into();
        let use_session = base_url.trim_end_matches('/') == YAHOO_BASE_URL;
        Self::build(base_url, use_session, timeout)
    }

    fn build(base_url: String, use_session: bool, timeout: Duration) -> Result<Self, MarketDataError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| MarketDataError::Provider {
                provider: YAHOO_PROVIDER_ID.to_string(),
                message: format!("Failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            use_session,
            timeout,
            session: RwLock::new(None),
        })
    }

    /// Build the quote request URL.
    fn quote_url(&self, symbols: &SymbolSet, crumb: Option<&str>) -> String {
        let mut url = format!(
            "{}/v7/finance/quote?symbols={}",
            self.base_url,
            encode(&symbols.joined())
        );
        if let Some(crumb) = crumb {
            url.push_str("&crumb=");
            url.push_str(&encode(crumb));
        }
        url
    }

    // ========================================================================
    // Crumb/Cookie Session
    // ========================================================================

    /// Ensure we have a valid Yahoo crumb, fetching one if needed.
    async fn ensure_session(&self) -> Result<CrumbData, MarketDataError> {
        {
            let guard = self.session.read().await;
            if let Some(crumb) = guard.as_ref() {
                return Ok(crumb.clone());
            }
        }

        let crumb = self.fetch_session().await?;
        *self.session.write().await = Some(crumb.clone());
        Ok(crumb)
    }

    async fn fetch_session(&self) -> Result<CrumbData, MarketDataError> {
        debug!("Acquiring Yahoo crumb session");

        // Step 1: Get cookie from fc.yahoo.com
        let response = self
            .client
            .get(YAHOO_COOKIE_URL)
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(YAHOO_PROVIDER_ID, e))?;

        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split_once(';').map(|(v, _)| v.to_string()))
            .ok_or_else(|| MarketDataError::Provider {
                provider: YAHOO_PROVIDER_ID.to_string(),
                message: "Failed to parse Yahoo cookie".to_string(),
            })?;

        // Step 2: Get crumb using cookie
        let response = self
            .client
            .get(format!("{}/v1/test/getcrumb", self.base_url))
            .header(header::COOKIE, &cookie)
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(YAHOO_PROVIDER_ID, e))?;

        if let Some(err) = classify_status(response.status()) {
            return Err(err);
        }

        let crumb = response
            .text()
            .await
            .map_err(|e| MarketDataError::from_transport(YAHOO_PROVIDER_ID, e))?;

        Ok(CrumbData { cookie, crumb })
    }

    /// Clear the cached crumb (used when authentication fails)
    async fn clear_session(&self) {
        *self.session.write().await = None;
    }

    // ========================================================================
    // Quote Fetching
    // ========================================================================

    async fn fetch_unbounded(&self, symbols: &SymbolSet) -> Result<RawPayload, MarketDataError> {
        let session = if self.use_session {
            Some(self.ensure_session().await?)
        } else {
            None
        };

        let url = self.quote_url(symbols, session.as_ref().map(|s| s.crumb.as_str()));
        debug!("Fetching quotes for {} from Yahoo", symbols);

        let mut request = self.client.get(&url);
        if let Some(session) = session.as_ref() {
            request = request.header(header::COOKIE, &session.cookie);
        }

        let response = request
            .send()
            .await
            .map_err(|e| MarketDataError::from_transport(YAHOO_PROVIDER_ID, e))?;

        if let Some(err) = classify_status(response.status()) {
            if matches!(err, MarketDataError::Auth { .. }) {
                warn!("Yahoo rejected the session, clearing cached crumb");
                self.clear_session().await;
            }
            return Err(err);
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| MarketDataError::from_transport(YAHOO_PROVIDER_ID, e))?;

        Ok(RawPayload::new(
            bytes.to_vec(),
            Utc::now(),
            Cow::Borrowed(YAHOO_PROVIDER_ID),
        ))
    }
}

/// Map a non-success HTTP status onto the fetch-stage taxonomy.
fn classify_status(status: StatusCode) -> Option<MarketDataError> {
    if status.is_success() {
        return None;
    }
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Some(MarketDataError::Auth {
            provider: YAHOO_PROVIDER_ID.to_string(),
            message: format!("HTTP {}", status),
        });
    }
    Some(MarketDataError::Provider {
        provider: YAHOO_PROVIDER_ID.to_string(),
        message: format!("HTTP {}", status),
    })
}

// ============================================================================
// QuoteSource Implementation
// ============================================================================

#[async_trait]
impl QuoteSource for YahooQuoteSource {
    fn id(&self) -> &'static str {
        YAHOO_PROVIDER_ID
    }

    async fn fetch(&self, symbols: &SymbolSet) -> Result<RawPayload, MarketDataError> {
        // The client timeout covers each request; this bounds the session
        // handshake plus the quote call together.
        match tokio::time::timeout(self.timeout, self.fetch_unbounded(symbols)).await {
            Ok(result) => result,
            Err(_) => Err(MarketDataError::Timeout {
                provider: YAHOO_PROVIDER_ID.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_url_encodes_symbols_and_crumb() {
        let source = YahooQuoteSource::new(Duration::from_secs(5)).unwrap();
        let symbols = SymbolSet::parse("MSFT,BRK-B,EURUSD=X").unwrap();
        let url = source.quote_url(&symbols, Some("a/b"));
        assert_eq!(
            url,
            "https://query1.finance.yahoo.com/v7/finance/quote?symbols=MSFT%2CBRK-B%2CEURUSD%3DX&crumb=a%2Fb"
        );
    }

    #[test]
    fn test_custom_base_url_skips_session() {
        let source =
            YahooQuoteSource::with_base_url("http://127.0.0.1:9000/", Duration::from_secs(5)).unwrap();
        assert!(!source.use_session);
        let symbols = SymbolSet::parse("AAPL").unwrap();
        assert_eq!(
            source.quote_url(&symbols, None),
            "http://127.0.0.1:9000/v7/finance/quote?symbols=AAPL"
        );

        let default_host =
            YahooQuoteSource::with_base_url(YAHOO_BASE_URL, Duration::from_secs(5)).unwrap();
        assert!(default_host.use_session);
    }

    #[test]
    fn test_classify_status() {
        assert!(classify_status(StatusCode::OK).is_none());
        assert!(matches!(
            classify_status(StatusCode::UNAUTHORIZED),
            Some(MarketDataError::Auth { .. })
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN),
            Some(MarketDataError::Auth { .. })
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            Some(MarketDataError::Provider { .. })
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            Some(MarketDataError::Provider { .. })
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_stage_error() {
        let source =
            YahooQuoteSource::with_base_url("http://127.0.0.1:1", Duration::from_millis(500)).unwrap();
        let symbols = SymbolSet::parse("AAPL").unwrap();
        let err = source.fetch(&symbols).await.unwrap_err();
        assert_eq!(err.stage(), crate::errors::FailureStage::Fetch);
    }
}
