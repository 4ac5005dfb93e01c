//! Jurisdiction sum type
//!
//! A jurisdiction is exactly one of national or a reference into one of the
//! five canonical jurisdiction tables. The kind and the id travel together so
//! an inconsistent pair cannot be constructed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Jurisdiction discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JurisdictionKind {
    National,
    Region,
    Province,
    City,
    Barangay,
    District,
}

impl JurisdictionKind {
    pub const ALL: [JurisdictionKind; 6] = [
        JurisdictionKind::National,
        JurisdictionKind::Region,
        JurisdictionKind::Province,
        JurisdictionKind::City,
        JurisdictionKind::Barangay,
        JurisdictionKind::District,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JurisdictionKind::National => "national",
            JurisdictionKind::Region => "region",
            JurisdictionKind::Province => "province",
            JurisdictionKind::City => "city",
            JurisdictionKind::Barangay => "barangay",
            JurisdictionKind::District => "district",
        }
    }

    /// Canonical table holding jurisdictions of this kind (none for national)
    pub fn table(&self) -> Option<&'static str> {
        match self {
            JurisdictionKind::National => None,
            JurisdictionKind::Region => Some("regions"),
            JurisdictionKind::Province => Some("provinces"),
            JurisdictionKind::City => Some("cities"),
            JurisdictionKind::Barangay => Some("barangays"),
            JurisdictionKind::District => Some("districts"),
        }
    }
}

impl fmt::Display for JurisdictionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JurisdictionKind {
    type Err = String;

    /// Accepts the canonical names plus the spreadsheet spellings in use
    /// ("municipality" shares the city table).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "national" | "nationwide" => Ok(JurisdictionKind::National),
            "region" | "regional" => Ok(JurisdictionKind::Region),
            "province" | "provincial" => Ok(JurisdictionKind::Province),
            "city" | "municipality" | "municipal" => Ok(JurisdictionKind::City),
            "barangay" => Ok(JurisdictionKind::Barangay),
            "district" | "legislative district" => Ok(JurisdictionKind::District),
            other => Err(format!(
                "unknown jurisdiction type '{}' (expected one of national, region, province, city, barangay, district)",
                other
            )),
        }
    }
}

/// Scope over which a position has authority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum Jurisdiction {
    National,
    Region(Uuid),
    Province(Uuid),
    City(Uuid),
    Barangay(Uuid),
    District(Uuid),
}

impl Jurisdiction {
    pub fn kind(&self) -> JurisdictionKind {
        match self {
            Jurisdiction::National => JurisdictionKind::National,
            Jurisdiction::Region(_) => JurisdictionKind::Region,
            Jurisdiction::Province(_) => JurisdictionKind::Province,
            Jurisdiction::City(_) => JurisdictionKind::City,
            Jurisdiction::Barangay(_) => JurisdictionKind::Barangay,
            Jurisdiction::District(_) => JurisdictionKind::District,
        }
    }

    pub fn id(&self) -> Option<Uuid> {
        match self {
            Jurisdiction::National => None,
            Jurisdiction::Region(id)
            | Jurisdiction::Province(id)
            | Jurisdiction::City(id)
            | Jurisdiction::Barangay(id)
            | Jurisdiction::District(id) => Some(*id),
        }
    }

    /// Rebuild from stored columns
    ///
    /// National must carry no id; every other kind must carry one.
    pub fn from_parts(kind: JurisdictionKind, id: Option<Uuid>) -> Result<Self, String> {
        match (kind, id) {
            (JurisdictionKind::National, None) => Ok(Jurisdiction::National),
            (JurisdictionKind::National, Some(id)) => {
                Err(format!("national jurisdiction cannot reference id {}", id))
            }
            (JurisdictionKind::Region, Some(id)) => Ok(Jurisdiction::Region(id)),
            (JurisdictionKind::Province, Some(id)) => Ok(Jurisdiction::Province(id)),
            (JurisdictionKind::City, Some(id)) => Ok(Jurisdiction::City(id)),
            (JurisdictionKind::Barangay, Some(id)) => Ok(Jurisdiction::Barangay(id)),
            (JurisdictionKind::District, Some(id)) => Ok(Jurisdiction::District(id)),
            (kind, None) => Err(format!("{} jurisdiction requires an id", kind)),
        }
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.id() {
            Some(id) => write!(f, "{}:{}", self.kind(), id),
            None => f.write_str("national"),
        }
    }
}

/// Row from one of the canonical jurisdiction tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JurisdictionRecord {
    pub jurisdiction: Jurisdiction,
    pub name: String,
    /// Name of the enclosing jurisdiction (region of a province, ...)
    pub parent_name: Option<String>,
}

impl JurisdictionRecord {
    /// "Name (Parent)" label used when listing ambiguous candidates
    pub fn label(&self) -> String {
        match &self.parent_name {
            Some(parent) => format!("{} ({})", self.name, parent),
            None => self.name.clone(),
        }
    }
}
