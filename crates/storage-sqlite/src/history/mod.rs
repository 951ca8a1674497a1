//! Quote history: the `quote_history` table and the durable store over it.

mod model;
mod repository;

pub use model::QuoteHistoryDB;
pub use repository::SqliteDurableStore;
