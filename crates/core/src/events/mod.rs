//! Ingestion events module.
//!
//! Provides the structured events produced by the pipeline and the sink trait
//! they are emitted through. The sink is injected into every job; runtime
//! adapters (the server's tracing sink, test collectors) decide where events go.

mod ingest_event;
mod sink;

pub use ingest_event::*;
pub use sink::*;
