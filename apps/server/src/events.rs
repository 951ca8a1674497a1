//! Renders ingestion events as tracing events.

use quotefeed_core::{IngestEvent, IngestEventSink, TickStatus};

/// Sink that turns each [`IngestEvent`] into one structured tracing event
/// under the `quotefeed::events` target.
#[derive(Clone, Default)]
pub struct TracingEventSink;

impl IngestEventSink for TracingEventSink {
    fn emit(&self, event: IngestEvent) {
        let at = event.at().to_rfc3339();
        match event {
            IngestEvent::TickFinished {
                job_id,
                status,
                records,
                dropped,
                persisted,
                cache_updated,
                error,
                ..
            } => {
                match status {
                    TickStatus::Success => tracing::info!(
                        target: "quotefeed::events",
                        %at, %job_id, %status, records, dropped, persisted, cache_updated,
                        "tick finished"
                    ),
                    TickStatus::Partial => tracing::warn!(
                        target: "quotefeed::events",
                        %at, %job_id, %status, records, dropped, persisted, cache_updated,
                        error = error.as_deref().unwrap_or(""),
                        "tick finished"
                    ),
                    TickStatus::Failure => tracing::error!(
                        target: "quotefeed::events",
                        %at, %job_id, %status, records, dropped, persisted, cache_updated,
                        error = error.as_deref().unwrap_or(""),
                        "tick finished"
                    ),
                }
            }
            IngestEvent::TickSkipped { job_id, .. } => tracing::info!(
                target: "quotefeed::events",
                %at, %job_id,
                "tick skipped, previous tick still running"
            ),
            IngestEvent::RecordDropped {
                job_id,
                index,
                symbol,
                reason,
                ..
            } => tracing::warn!(
                target: "quotefeed::events",
                %at, %job_id, index, symbol = symbol.as_deref().unwrap_or(""), %reason,
                "record dropped"
            ),
            IngestEvent::StoreAvailabilityChanged {
                job_id,
                store,
                available,
                ..
            } => {
                if available {
                    tracing::info!(target: "quotefeed::events", %at, %job_id, %store, available, "store availability changed");
                } else {
                    tracing::warn!(target: "quotefeed::events", %at, %job_id, %store, available, "store availability changed");
                }
            }
            IngestEvent::BatchLost {
                job_id,
                records,
                attempts,
                error,
                ..
            } => tracing::error!(
                target: "quotefeed::events",
                %at, %job_id, records, attempts, %error,
                "batch lost"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quotefeed_core::StoreKind;

    #[test]
    fn test_emit_every_kind_without_subscriber() {
        let sink = TracingEventSink;
        sink.emit_batch(vec![
            IngestEvent::tick_skipped("tech"),
            IngestEvent::record_dropped("tech", 1, None, "missing mandatory field 'symbol'"),
            IngestEvent::store_availability_changed("tech", StoreKind::Cache, false),
            IngestEvent::batch_lost("tech", 2, 3, "database is locked"),
            IngestEvent::TickFinished {
                at: chrono::Utc::now(),
                job_id: "tech".to_string(),
                status: TickStatus::Failure,
                records: 2,
                dropped: 0,
                persisted: false,
                cache_updated: true,
                error: Some("database is locked".to_string()),
            },
        ]);
    }
}
