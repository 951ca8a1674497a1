//! Ingestion event sink trait and implementations.

use std::sync::{Arc, Mutex, MutexGuard};

use super::IngestEvent;

/// Trait for receiving ingestion events.
///
/// Implementations translate events into logs, metrics or alerts.
///
/// # Design Rules
///
/// - `emit()` must be fast and non-blocking (no network calls, no DB writes)
/// - Failure to emit must not affect the tick that produced the event
pub trait IngestEventSink: Send + Sync {
    /// Emit a single event.
    fn emit(&self, event: IngestEvent);

    /// Emit multiple events.
    ///
    /// Default implementation calls `emit()` for each event.
    fn emit_batch(&self, events: Vec<IngestEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

/// No-op implementation for contexts that don't need events.
#[derive(Clone, Default)]
pub struct NoOpIngestEventSink;

impl IngestEventSink for NoOpIngestEventSink {
    fn emit(&self, _event: IngestEvent) {}
}

/// Collecting sink for tests.
#[derive(Clone, Default)]
pub struct MockIngestEventSink {
    events: Arc<Mutex<Vec<IngestEvent>>>,
}

impl MockIngestEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<IngestEvent>> {
        self.events.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Returns all collected events.
    pub fn events(&self) -> Vec<IngestEvent> {
        self.lock().clone()
    }

    /// Returns collected events of one kind (see [`IngestEvent::kind`]).
    pub fn events_of(&self, kind: &str) -> Vec<IngestEvent> {
        self.lock()
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }

    /// Clears collected events.
    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl IngestEventSink for MockIngestEventSink {
    fn emit(&self, event: IngestEvent) {
        self.lock().push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_noop_sink_does_not_panic() {
        let sink = NoOpIngestEventSink;
        sink.emit(IngestEvent::tick_skipped("tech"));
        sink.emit_batch(vec![
            IngestEvent::tick_skipped("tech"),
            IngestEvent::tick_skipped("energy"),
        ]);
    }

    #[test]
    fn test_mock_sink_collects_events() {
        let sink = MockIngestEventSink::new();
        assert!(sink.is_empty());

        sink.emit(IngestEvent::tick_skipped("tech"));
        sink.emit_batch(vec![
            IngestEvent::batch_lost("tech", 2, 3, "locked"),
            IngestEvent::tick_skipped("energy"),
        ]);
        assert_eq!(sink.len(), 3);
        assert_eq!(sink.events_of("tick_skipped").len(), 2);
        assert_eq!(sink.events_of("batch_lost")[0].job_id(), "tech");

        sink.clear();
        assert!(sink.is_empty());
    }
}
