//! Event types for the civic event system
//!
//! Provides shared event definitions and the EventBus used to fan events out
//! to SSE clients and in-process listeners.

mod import_types;

pub use import_types::{ImportOutcome, RowOutcome};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Civic event types
///
/// Events are broadcast via EventBus and can be serialized for SSE transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CivicEvent {
    /// Import run created and about to process rows
    ///
    /// Triggers:
    /// - SSE: Show progress panel
    ImportStarted {
        /// Import log UUID
        log_id: Uuid,
        /// Uploaded file name
        filename: String,
        /// Rows read from the file
        total_rows: usize,
        /// Whether the run commits nothing
        validate_only: bool,
        /// When the run started
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Progress snapshot emitted after every processed row
    ///
    /// NOTE: Not persisted as an event; the import log row carries the
    /// same counters.
    ImportProgressUpdate {
        /// Import log UUID
        log_id: Uuid,
        /// Rows processed so far
        processed_rows: usize,
        /// Rows read from the file
        total_rows: usize,
        /// Rows committed (or valid, in validate-only runs)
        successful_rows: usize,
        /// Rows rejected
        failed_rows: usize,
        /// Spreadsheet row number just processed
        current_row: usize,
        /// What happened to that row
        row_outcome: RowOutcome,
        /// Human-readable status line
        message: String,
        /// Snapshot time
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Import run reached a terminal status
    ///
    /// Triggers:
    /// - SSE: Show summary and error report link
    ImportFinished {
        /// Import log UUID
        log_id: Uuid,
        /// Terminal outcome
        outcome: ImportOutcome,
        /// Rows committed
        successful_rows: usize,
        /// Rows rejected
        failed_rows: usize,
        /// Run duration in seconds
        duration_seconds: u64,
        /// When the run finished
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Import run aborted before row processing
    ImportFailed {
        /// Import log UUID
        log_id: Uuid,
        /// Fatal error message
        error_message: String,
        /// When the run failed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A politician became current holder of a position
    PositionAssigned {
        /// New history entry
        entry_id: Uuid,
        /// Politician now holding the position
        politician_id: Uuid,
        /// Position held
        position_id: Uuid,
        /// Entry that was ended to make room, if any
        superseded_entry_id: Option<Uuid>,
        /// When the assignment committed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A term was ended outside of a supersession
    TermEnded {
        /// Ended history entry
        entry_id: Uuid,
        /// Reason recorded on the entry
        ended_reason: String,
        /// When the term was ended
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl CivicEvent {
    /// Event name used as the SSE `event:` field
    pub fn event_type(&self) -> &str {
        match self {
            CivicEvent::ImportStarted { .. } => "ImportStarted",
            CivicEvent::ImportProgressUpdate { .. } => "ImportProgressUpdate",
            CivicEvent::ImportFinished { .. } => "ImportFinished",
            CivicEvent::ImportFailed { .. } => "ImportFailed",
            CivicEvent::PositionAssigned { .. } => "PositionAssigned",
            CivicEvent::TermEnded { .. } => "TermEnded",
        }
    }

    /// Whether the event belongs to the import stream
    pub fn is_import_event(&self) -> bool {
        matches!(
            self,
            CivicEvent::ImportStarted { .. }
                | CivicEvent::ImportProgressUpdate { .. }
                | CivicEvent::ImportFinished { .. }
                | CivicEvent::ImportFailed { .. }
        )
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Broadcast bus for civic events
///
/// Cloning the bus shares the underlying channel.
///
/// ```
/// use civic_common::events::EventBus;
///
/// let event_bus = EventBus::new(100);
/// let _rx = event_bus.subscribe();
/// assert_eq!(event_bus.subscriber_count(), 1);
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<CivicEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// * `capacity` - Number of events to buffer before slow receivers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<CivicEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: CivicEvent,
    ) -> Result<usize, broadcast::error::SendError<CivicEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: CivicEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finished(log_id: Uuid) -> CivicEvent {
        CivicEvent::ImportFinished {
            log_id,
            outcome: ImportOutcome::Completed,
            successful_rows: 9,
            failed_rows: 1,
            duration_seconds: 2,
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let json = serde_json::to_value(finished(Uuid::new_v4())).unwrap();
        assert_eq!(json["type"], "ImportFinished");
        assert_eq!(json["outcome"], "completed");
        assert_eq!(json["failed_rows"], 1);
    }

    #[test]
    fn test_import_event_filter() {
        assert!(finished(Uuid::new_v4()).is_import_event());

        let ended = CivicEvent::TermEnded {
            entry_id: Uuid::new_v4(),
            ended_reason: "resigned".to_string(),
            timestamp: chrono::Utc::now(),
        };
        assert!(!ended.is_import_event());
        assert_eq!(ended.event_type(), "TermEnded");
    }

    #[tokio::test]
    async fn test_emit_reaches_subscriber() {
        let bus = EventBus::new(10);
        let mut rx = bus.subscribe();
        let log_id = Uuid::new_v4();

        bus.emit(finished(log_id)).unwrap();

        match rx.recv().await.unwrap() {
            CivicEvent::ImportFinished { log_id: got, .. } => assert_eq!(got, log_id),
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_emit_without_subscribers() {
        let bus = EventBus::new(4);
        assert!(bus.emit(finished(Uuid::new_v4())).is_err());
        // Lossy variant never fails
        bus.emit_lossy(finished(Uuid::new_v4()));
        assert_eq!(bus.capacity(), 4);
    }
}
