//! Market data models
//!
//! This module contains the core data types for quote ingestion:
//! - `types` - Type aliases for common identifiers (ProviderId)
//! - `symbols` - Validated symbol sets (SymbolSet)
//! - `quote` - The normalized quote record (Quote)
//! - `batch` - Fetch and parse results (RawPayload, QuoteBatch, ParsedBatch, DroppedRecord)

mod batch;
mod quote;
mod symbols;
mod types;

pub use batch::{DropReason, DroppedRecord, ParsedBatch, QuoteBatch, RawPayload};
pub use quote::{Quote, DEFAULT_QUOTE_TYPE};
pub use symbols::SymbolSet;
pub use types::ProviderId;
