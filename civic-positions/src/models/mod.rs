//! Data models for position history tracking and imports

pub mod election;
pub mod history;
pub mod import_log;
pub mod import_row;
pub mod jurisdiction;
pub mod reference;

pub use election::{ElectionEvent, ElectionStatus};
pub use history::{
    AssignAction, AssignOutcome, AssignPositionRequest, EndTermRequest, EndedReason,
    PoliticianPositionTimeline, PositionHistoryEntry, TimelineEntry,
};
pub use import_log::{ImportLog, ImportProgress, ImportStatus, ImportValidationResult};
pub use import_row::{
    ErrorKind, ImportRow, PoliticianRef, ResolvedRow, ValidatedRow, ValidationError,
};
pub use jurisdiction::{Jurisdiction, JurisdictionKind, JurisdictionRecord};
pub use reference::{Branch, Party, Politician, Position, PositionLevel};
