//! Import run log and progress snapshots
//!
//! Status machine: pending → processing → completed | failed.
//! A pending log may also fail directly (unreadable file).

use chrono::{DateTime, Utc};
use civic_common::events::RowOutcome;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::import_row::{ImportRow, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl ImportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Processing => "processing",
            ImportStatus::Completed => "completed",
            ImportStatus::Failed => "failed",
        }
    }

    pub fn can_transition_to(&self, next: ImportStatus) -> bool {
        matches!(
            (self, next),
            (ImportStatus::Pending, ImportStatus::Processing)
                | (ImportStatus::Pending, ImportStatus::Failed)
                | (ImportStatus::Processing, ImportStatus::Completed)
                | (ImportStatus::Processing, ImportStatus::Failed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ImportStatus::Completed | ImportStatus::Failed)
    }
}

impl FromStr for ImportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ImportStatus::Pending),
            "processing" => Ok(ImportStatus::Processing),
            "completed" => Ok(ImportStatus::Completed),
            "failed" => Ok(ImportStatus::Failed),
            other => Err(format!("unknown import status '{}'", other)),
        }
    }
}

/// One import run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportLog {
    pub id: Uuid,
    pub filename: String,
    pub election_id: Option<Uuid>,
    pub validate_only: bool,
    pub status: ImportStatus,

    pub total_rows: usize,
    pub processed_rows: usize,
    pub successful_imports: usize,
    pub failed_imports: usize,
    pub politicians_created: usize,
    pub politicians_updated: usize,
    pub positions_archived: usize,

    /// Every row-scoped error of the run
    pub validation_errors: Vec<ValidationError>,
    /// Raw content of each failed row, for the error report
    pub failed_rows: Vec<ImportRow>,

    /// Stopped early on request
    pub cancelled: bool,
    /// Fatal error of a failed run
    pub error_message: Option<String>,

    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl ImportLog {
    pub fn new(filename: String, election_id: Option<Uuid>, validate_only: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename,
            election_id,
            validate_only,
            status: ImportStatus::Pending,
            total_rows: 0,
            processed_rows: 0,
            successful_imports: 0,
            failed_imports: 0,
            politicians_created: 0,
            politicians_updated: 0,
            positions_archived: 0,
            validation_errors: Vec::new(),
            failed_rows: Vec::new(),
            cancelled: false,
            error_message: None,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Move to `next`, stamping `completed_at` on terminal states
    ///
    /// Returns false (and changes nothing) for a transition the status
    /// machine does not allow.
    pub fn transition_to(&mut self, next: ImportStatus) -> bool {
        if !self.status.can_transition_to(next) {
            return false;
        }
        self.status = next;
        if next.is_terminal() {
            self.completed_at = Some(Utc::now());
        }
        true
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Count a successfully processed row
    pub fn record_success(&mut self) {
        self.processed_rows += 1;
        self.successful_imports += 1;
    }

    /// Count a failed row, keeping its raw content and errors
    pub fn record_failure(&mut self, raw: ImportRow, errors: Vec<ValidationError>) {
        self.processed_rows += 1;
        self.failed_imports += 1;
        self.validation_errors.extend(errors);
        self.failed_rows.push(raw);
    }

    pub fn duration_seconds(&self) -> u64 {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds().max(0) as u64
    }

    /// Snapshot for the progress sink
    pub fn progress(&self, current_row: usize, row_outcome: RowOutcome, message: String) -> ImportProgress {
        ImportProgress {
            log_id: self.id,
            processed_rows: self.processed_rows,
            total_rows: self.total_rows,
            successful_rows: self.successful_imports,
            failed_rows: self.failed_imports,
            current_row,
            row_outcome,
            message,
        }
    }
}

/// Progress snapshot emitted between rows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportProgress {
    pub log_id: Uuid,
    pub processed_rows: usize,
    pub total_rows: usize,
    pub successful_rows: usize,
    pub failed_rows: usize,
    pub current_row: usize,
    pub row_outcome: RowOutcome,
    pub message: String,
}

impl ImportProgress {
    /// Percentage complete (0.0 - 100.0)
    pub fn percentage(&self) -> f64 {
        if self.total_rows == 0 {
            return 100.0;
        }
        (self.processed_rows as f64 / self.total_rows as f64) * 100.0
    }
}

/// Result of a validate-only pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportValidationResult {
    pub total_rows: usize,
    pub valid_rows: usize,
    pub invalid_rows: usize,
    pub errors: Vec<ValidationError>,
    /// Raw content of each invalid row, for the error report
    pub failed_rows: Vec<ImportRow>,
}

impl ImportValidationResult {
    pub fn is_valid(&self) -> bool {
        self.invalid_rows == 0
    }
}
