//! Reference data owned by the administrative layer
//!
//! Positions, parties and politicians are read (and politicians created) by
//! the import path; positions and parties are never written here.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use super::jurisdiction::JurisdictionKind;

/// Government level a position belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionLevel {
    National,
    Regional,
    Provincial,
    City,
    Municipal,
    Barangay,
}

impl PositionLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            PositionLevel::National => "national",
            PositionLevel::Regional => "regional",
            PositionLevel::Provincial => "provincial",
            PositionLevel::City => "city",
            PositionLevel::Municipal => "municipal",
            PositionLevel::Barangay => "barangay",
        }
    }
}

impl fmt::Display for PositionLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PositionLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "national" => Ok(PositionLevel::National),
            "regional" => Ok(PositionLevel::Regional),
            "provincial" => Ok(PositionLevel::Provincial),
            "city" => Ok(PositionLevel::City),
            "municipal" => Ok(PositionLevel::Municipal),
            "barangay" => Ok(PositionLevel::Barangay),
            other => Err(format!("unknown position level '{}'", other)),
        }
    }
}

/// Branch of government
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Branch {
    Executive,
    Legislative,
    Judicial,
}

impl Branch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Branch::Executive => "executive",
            Branch::Legislative => "legislative",
            Branch::Judicial => "judicial",
        }
    }
}

impl FromStr for Branch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "executive" => Ok(Branch::Executive),
            "legislative" => Ok(Branch::Legislative),
            "judicial" => Ok(Branch::Judicial),
            other => Err(format!("unknown branch '{}'", other)),
        }
    }
}

/// Government position (immutable reference data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub level: PositionLevel,
    pub branch: Branch,
    pub term_years: u32,
    pub max_terms: Option<u32>,
    pub is_elected: bool,
}

impl Position {
    /// Jurisdiction kinds this position may be held in
    ///
    /// Cities and municipalities share one table. Legislative districts are
    /// open to legislative seats at national, provincial and city level.
    pub fn compatible_jurisdictions(&self) -> Vec<JurisdictionKind> {
        let mut kinds = vec![match self.level {
            PositionLevel::National => JurisdictionKind::National,
            PositionLevel::Regional => JurisdictionKind::Region,
            PositionLevel::Provincial => JurisdictionKind::Province,
            PositionLevel::City | PositionLevel::Municipal => JurisdictionKind::City,
            PositionLevel::Barangay => JurisdictionKind::Barangay,
        }];

        if self.branch == Branch::Legislative
            && matches!(
                self.level,
                PositionLevel::National | PositionLevel::Provincial | PositionLevel::City
            )
        {
            kinds.push(JurisdictionKind::District);
        }

        kinds
    }

    pub fn accepts(&self, kind: JurisdictionKind) -> bool {
        self.compatible_jurisdictions().contains(&kind)
    }
}

/// Political party (immutable reference data)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Party {
    pub id: Uuid,
    pub name: String,
    pub abbreviation: Option<String>,
    pub color: Option<String>,
}

/// Politician as seen by the import path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Politician {
    pub id: Uuid,
    pub name: String,
}
