//! Quotefeed Market Data Crate
//!
//! This crate covers the provider side of the ingestion pipeline: fetching raw
//! quote payloads from an external provider and normalizing them into typed
//! [`Quote`] records.
//!
//! # Architecture
//!
//! ```text
//! +------------------+     +------------------+     +------------------+
//! |    SymbolSet     | --> |   QuoteSource    | --> |    RawPayload    |
//! +------------------+     +------------------+     +------------------+
//!                                                           |
//!                                                           v
//!                          +------------------+     +------------------+
//!                          |   ParsedBatch    | <-- |   QuoteParser    |
//!                          +------------------+     +------------------+
//!                            QuoteBatch + dropped records
//! ```
//!
//! Transport and schema concerns are kept apart: a [`QuoteSource`] only moves
//! bytes, a [`QuoteParser`] only interprets them.
//!
//! # Core Types
//!
//! - [`SymbolSet`] - Validated, uppercase, de-duplicated symbol list
//! - [`RawPayload`] - Opaque provider response tagged with its fetch time
//! - [`Quote`] - One symbol's normalized market snapshot
//! - [`QuoteBatch`] - Quotes produced by one fetch cycle
//! - [`ParsedBatch`] - A batch plus the records dropped while parsing

pub mod errors;
pub mod models;
pub mod parser;
pub mod provider;

pub use errors::{FailureStage, MarketDataError};

pub use models::{
    DropReason, DroppedRecord, ParsedBatch, ProviderId, Quote, QuoteBatch, RawPayload, SymbolSet,
};

pub use parser::{QuoteParser, YahooQuoteParser};
pub use provider::yahoo::{YahooQuoteSource, YAHOO_BASE_URL};
pub use provider::QuoteSource;
