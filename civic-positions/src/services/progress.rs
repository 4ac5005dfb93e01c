//! Progress sinks
//!
//! The pipeline hands a snapshot to a sink after each processed row and does
//! not know where it goes. Sinks must not block: a slow consumer drops
//! snapshots rather than stalling the import.

use chrono::Utc;
use civic_common::events::{CivicEvent, EventBus};
use tokio::sync::mpsc;

use crate::models::ImportProgress;

pub trait ProgressSink: Send + Sync {
    fn emit(&self, progress: ImportProgress);
}

/// Discards everything
pub struct NoopProgressSink;

impl ProgressSink for NoopProgressSink {
    fn emit(&self, _progress: ImportProgress) {}
}

/// Publishes `ImportProgressUpdate` on the event bus (streamed over SSE)
pub struct EventBusProgressSink {
    event_bus: EventBus,
}

impl EventBusProgressSink {
    pub fn new(event_bus: EventBus) -> Self {
        Self { event_bus }
    }
}

impl ProgressSink for EventBusProgressSink {
    fn emit(&self, progress: ImportProgress) {
        self.event_bus.emit_lossy(CivicEvent::ImportProgressUpdate {
            log_id: progress.log_id,
            processed_rows: progress.processed_rows,
            total_rows: progress.total_rows,
            successful_rows: progress.successful_rows,
            failed_rows: progress.failed_rows,
            current_row: progress.current_row,
            row_outcome: progress.row_outcome,
            message: progress.message,
            timestamp: Utc::now(),
        });
    }
}

/// Forwards snapshots to a channel; full or closed channels drop them
pub struct ChannelProgressSink {
    tx: mpsc::Sender<ImportProgress>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<ImportProgress>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, progress: ImportProgress) {
        if let Err(e) = self.tx.try_send(progress) {
            tracing::trace!("Progress snapshot dropped: {}", e);
        }
    }
}
