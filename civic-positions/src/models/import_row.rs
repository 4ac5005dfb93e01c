//! Raw and validated import rows
//!
//! Errors here are row-scoped data, collected per row and never fatal to a
//! batch.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jurisdiction::Jurisdiction;
use super::reference::{Party, Position};

/// Column names, in report order
pub const FIELD_NAME: &str = "name";
pub const FIELD_POSITION: &str = "position";
pub const FIELD_JURISDICTION_TYPE: &str = "jurisdiction_type";
pub const FIELD_JURISDICTION_NAME: &str = "jurisdiction_name";
pub const FIELD_PARENT_JURISDICTION: &str = "parent_jurisdiction";
pub const FIELD_PARTY: &str = "party";
pub const FIELD_TERM_START: &str = "term_start";
pub const FIELD_TERM_END: &str = "term_end";
/// Pseudo-field for errors raised while committing a row
pub const FIELD_ROW: &str = "row";

/// One spreadsheet row as parsed, all values still text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportRow {
    /// Spreadsheet row number (header is row 1)
    pub row_number: usize,
    pub name: Option<String>,
    pub position: Option<String>,
    pub jurisdiction_type: Option<String>,
    pub jurisdiction_name: Option<String>,
    /// Enclosing jurisdiction, used to disambiguate shared names
    pub parent_jurisdiction: Option<String>,
    pub party: Option<String>,
    pub term_start: Option<String>,
    pub term_end: Option<String>,
}

impl ImportRow {
    /// Raw value of a column by field name
    pub fn field(&self, field: &str) -> Option<&str> {
        let value = match field {
            FIELD_NAME => &self.name,
            FIELD_POSITION => &self.position,
            FIELD_JURISDICTION_TYPE => &self.jurisdiction_type,
            FIELD_JURISDICTION_NAME => &self.jurisdiction_name,
            FIELD_PARENT_JURISDICTION => &self.parent_jurisdiction,
            FIELD_PARTY => &self.party,
            FIELD_TERM_START => &self.term_start,
            FIELD_TERM_END => &self.term_end,
            _ => return None,
        };
        value.as_deref()
    }

    /// True when every column is empty
    pub fn is_blank(&self) -> bool {
        [
            &self.name,
            &self.position,
            &self.jurisdiction_type,
            &self.jurisdiction_name,
            &self.parent_jurisdiction,
            &self.party,
            &self.term_start,
            &self.term_end,
        ]
        .iter()
        .all(|v| v.as_deref().map_or(true, |s| s.trim().is_empty()))
    }
}

/// Error taxonomy for row-scoped failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or malformed value
    FieldValidation,
    /// Reference could not be matched; suggestions may be attached
    ResolutionNotFound,
    /// Reference matched more than one record
    ResolutionAmbiguous,
    /// Current-holder constraint rejected the commit
    ConstraintViolation,
    /// Timeout or lock contention; retry may succeed
    TransientStoreError,
}

/// One problem with one field of one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    pub row_number: usize,
    pub field: String,
    pub kind: ErrorKind,
    pub message: String,
    pub raw_value: Option<String>,
    #[serde(default)]
    pub suggestions: Vec<String>,
}

impl ValidationError {
    pub fn new(row_number: usize, field: &str, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            row_number,
            field: field.to_string(),
            kind,
            message: message.into(),
            raw_value: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_raw_value(mut self, raw_value: Option<&str>) -> Self {
        self.raw_value = raw_value.map(str::to_string);
        self
    }

    pub fn with_suggestions(mut self, suggestions: Vec<String>) -> Self {
        self.suggestions = suggestions;
        self
    }
}

/// Politician a row refers to
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PoliticianRef {
    /// Matched an existing politician
    Existing { id: Uuid },
    /// No match; created on commit
    New { name: String },
}

/// Fully resolved content of a valid row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedRow {
    pub politician: PoliticianRef,
    pub position: Position,
    pub jurisdiction: Jurisdiction,
    pub party: Option<Party>,
    pub term_start: NaiveDate,
    pub term_end: Option<NaiveDate>,
}

/// Outcome of validating one row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatedRow {
    pub row_number: usize,
    pub raw: ImportRow,
    /// Present exactly when the row is valid
    pub resolved: Option<ResolvedRow>,
    pub is_valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidatedRow {
    pub fn valid(raw: ImportRow, resolved: ResolvedRow) -> Self {
        Self {
            row_number: raw.row_number,
            raw,
            resolved: Some(resolved),
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn invalid(raw: ImportRow, errors: Vec<ValidationError>) -> Self {
        Self {
            row_number: raw.row_number,
            raw,
            resolved: None,
            is_valid: false,
            errors,
        }
    }
}
