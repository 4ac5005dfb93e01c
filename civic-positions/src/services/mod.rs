//! Services for position history and imports

pub mod import_log_recorder;
pub mod import_pipeline;
pub mod position_history;
pub mod progress;

pub use import_log_recorder::ImportLogRecorder;
pub use import_pipeline::ImportPipeline;
pub use position_history::{AssignmentScope, PositionHistoryStore};
pub use progress::{ChannelProgressSink, EventBusProgressSink, NoopProgressSink, ProgressSink};
