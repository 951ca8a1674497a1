//! Payload parsers.
//!
//! A parser turns a [`RawPayload`] into a [`ParsedBatch`]. It is a pure,
//! stateless transform: no I/O, no clock, no shared state.
//!
//! # Partial tolerance
//!
//! Only an undecodable payload or a missing envelope fails the parse. A record
//! that lacks a mandatory field is dropped and reported in
//! [`ParsedBatch::dropped`]; the rest of the batch goes through.

mod yahoo;

pub use yahoo::YahooQuoteParser;

use crate::errors::MarketDataError;
use crate::models::{ParsedBatch, RawPayload};

/// Converts a provider payload into normalized quotes.
pub trait QuoteParser: Send + Sync {
    /// Parse one payload.
    ///
    /// Fails with [`MarketDataError::MalformedPayload`] when the bytes cannot
    /// be decoded and [`MarketDataError::SchemaMismatch`] when the envelope is
    /// missing a mandatory field.
    fn parse(&self, payload: &RawPayload) -> Result<ParsedBatch, MarketDataError>;
}
