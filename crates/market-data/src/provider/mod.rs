//! Quote source abstraction and implementations.
//!
//! This module contains:
//! - The `QuoteSource` trait every provider implements
//! - The Yahoo Finance implementation and its wire models
//!
//! A source performs exactly one outbound call per `fetch` and hands back
//! opaque bytes. Retries belong to the ingestion scheduler, decoding belongs
//! to the parser.

mod traits;

pub mod yahoo;

pub use traits::QuoteSource;
