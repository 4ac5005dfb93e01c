//! Position history ledger types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::jurisdiction::Jurisdiction;

/// Why a term ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndedReason {
    TermExpired,
    Resigned,
    Replaced,
    Election,
    Deceased,
    Other,
}

impl EndedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            EndedReason::TermExpired => "term_expired",
            EndedReason::Resigned => "resigned",
            EndedReason::Replaced => "replaced",
            EndedReason::Election => "election",
            EndedReason::Deceased => "deceased",
            EndedReason::Other => "other",
        }
    }
}

impl fmt::Display for EndedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EndedReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "term_expired" => Ok(EndedReason::TermExpired),
            "resigned" => Ok(EndedReason::Resigned),
            "replaced" => Ok(EndedReason::Replaced),
            "election" => Ok(EndedReason::Election),
            "deceased" => Ok(EndedReason::Deceased),
            "other" => Ok(EndedReason::Other),
            other => Err(format!("unknown ended reason '{}'", other)),
        }
    }
}

/// One term of one politician in one position and jurisdiction
///
/// Entries are never deleted. Ending a term flips `is_current` and fills
/// `term_end` / `ended_reason`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionHistoryEntry {
    pub id: Uuid,
    pub politician_id: Uuid,
    pub position_id: Uuid,
    pub party_id: Option<Uuid>,
    pub jurisdiction: Jurisdiction,
    pub term_start: NaiveDate,
    pub term_end: Option<NaiveDate>,
    pub is_current: bool,
    pub ended_reason: Option<EndedReason>,
    pub election_id: Option<Uuid>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input to `PositionHistoryStore::assign_position`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignPositionRequest {
    pub politician_id: Uuid,
    pub position_id: Uuid,
    pub jurisdiction: Jurisdiction,
    #[serde(default)]
    pub party_id: Option<Uuid>,
    pub term_start: NaiveDate,
    #[serde(default)]
    pub term_end: Option<NaiveDate>,
    #[serde(default)]
    pub election_id: Option<Uuid>,
    /// Always end the current entry, even when the same politician holds it
    #[serde(default)]
    pub with_history: bool,
    #[serde(default)]
    pub created_by: Option<String>,
}

/// Input to `PositionHistoryStore::end_term`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndTermRequest {
    pub end_date: NaiveDate,
    pub ended_reason: EndedReason,
}

/// How an assignment changed the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AssignAction {
    /// No current holder existed
    Created,
    /// Same politician re-assigned; current entry updated in place
    Updated,
    /// Previous current entry ended, new entry created
    Superseded { ended_entry_id: Uuid },
}

/// Result of an assignment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignOutcome {
    pub entry: PositionHistoryEntry,
    #[serde(flatten)]
    pub action: AssignAction,
}

impl AssignOutcome {
    pub fn superseded_entry_id(&self) -> Option<Uuid> {
        match self.action {
            AssignAction::Superseded { ended_entry_id } => Some(ended_entry_id),
            _ => None,
        }
    }
}

/// History entry with display names joined in
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub entry: PositionHistoryEntry,
    pub position_name: String,
    pub party_name: Option<String>,
}

/// Current and past positions of one politician
///
/// A politician may hold several positions at once (distinct position and
/// jurisdiction pairs), so `current` is a list. Both lists are ordered by
/// `term_start` descending.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoliticianPositionTimeline {
    pub politician_id: Uuid,
    pub current: Vec<TimelineEntry>,
    pub past: Vec<TimelineEntry>,
}
