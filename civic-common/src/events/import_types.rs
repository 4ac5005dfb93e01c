//! Import event type definitions
//!
//! Supporting types for import progress tracking.

use serde::{Deserialize, Serialize};

/// What happened to a single row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOutcome {
    /// Row validated (validate-only runs)
    Valid,
    /// New current holder created
    Created,
    /// Existing current entry updated in place
    Updated,
    /// Previous holder ended, new holder created
    Superseded,
    /// Row rejected with one or more errors
    Failed,
}

impl RowOutcome {
    pub fn is_success(&self) -> bool {
        !matches!(self, RowOutcome::Failed)
    }
}

/// Terminal outcome of an import run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportOutcome {
    /// All rows were processed
    Completed,
    /// Stopped early on request; committed rows remain
    Cancelled,
}
