//! Election events
//!
//! Status machine: scheduled → in_progress → completed | cancelled,
//! plus scheduled → cancelled.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use super::reference::PositionLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStatus {
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl ElectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElectionStatus::Scheduled => "scheduled",
            ElectionStatus::InProgress => "in_progress",
            ElectionStatus::Completed => "completed",
            ElectionStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: ElectionStatus) -> bool {
        matches!(
            (self, next),
            (ElectionStatus::Scheduled, ElectionStatus::InProgress)
                | (ElectionStatus::Scheduled, ElectionStatus::Cancelled)
                | (ElectionStatus::InProgress, ElectionStatus::Completed)
                | (ElectionStatus::InProgress, ElectionStatus::Cancelled)
        )
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ElectionStatus::Completed | ElectionStatus::Cancelled)
    }
}

impl FromStr for ElectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(ElectionStatus::Scheduled),
            "in_progress" => Ok(ElectionStatus::InProgress),
            "completed" => Ok(ElectionStatus::Completed),
            "cancelled" => Ok(ElectionStatus::Cancelled),
            other => Err(format!("unknown election status '{}'", other)),
        }
    }
}

/// Election that may originate a batch of history entries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectionEvent {
    pub id: Uuid,
    pub name: String,
    pub election_date: NaiveDate,
    pub level: PositionLevel,
    pub status: ElectionStatus,
}
