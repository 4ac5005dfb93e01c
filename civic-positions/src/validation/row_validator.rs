//! Row validator
//!
//! Turns one raw spreadsheet row into a resolved row or the complete list of
//! its field errors. Validation never stops at the first problem; a row with
//! three bad cells reports all three.
//!
//! Resolution only reads the directories, so any number of rows may be
//! validated concurrently. Each row is bounded by `row_timeout`; a row whose
//! lookups do not finish in time fails with a transient error instead of
//! stalling the batch.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::dates::parse_term_date;
use crate::config::ImportConfig;
use crate::directory::{Directories, PoliticianDirectory};
use crate::models::import_row::{
    FIELD_JURISDICTION_NAME, FIELD_JURISDICTION_TYPE, FIELD_NAME, FIELD_PARENT_JURISDICTION,
    FIELD_PARTY, FIELD_POSITION, FIELD_ROW, FIELD_TERM_END, FIELD_TERM_START,
};
use crate::models::{
    ErrorKind, ImportRow, Jurisdiction, JurisdictionKind, Party, PoliticianRef, Position,
    ResolvedRow, ValidatedRow, ValidationError,
};
use crate::resolvers::{
    name_key, JurisdictionResolver, PartyResolver, PositionResolver, ResolutionError,
};

pub struct RowValidator {
    jurisdictions: JurisdictionResolver,
    positions: PositionResolver,
    parties: PartyResolver,
    politicians: Arc<dyn PoliticianDirectory>,
    date_formats: Vec<String>,
    row_timeout: Duration,
}

/// Non-empty trimmed cell value
fn cell(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl RowValidator {
    pub fn new(directories: Directories, config: &ImportConfig) -> Self {
        Self {
            jurisdictions: JurisdictionResolver::new(directories.jurisdictions),
            positions: PositionResolver::new(
                directories.positions,
                config.fuzzy_threshold,
                config.max_suggestions,
            ),
            parties: PartyResolver::new(
                directories.parties,
                config.fuzzy_threshold,
                config.max_suggestions,
            ),
            politicians: directories.politicians,
            date_formats: config.date_formats.clone(),
            row_timeout: config.row_timeout(),
        }
    }

    /// Validate one row within the per-row timeout
    pub async fn validate(&self, row: ImportRow) -> ValidatedRow {
        match tokio::time::timeout(self.row_timeout, self.check(&row)).await {
            Ok(Ok(resolved)) => ValidatedRow::valid(row, resolved),
            Ok(Err(errors)) => {
                debug!(row = row.row_number, errors = errors.len(), "Row failed validation");
                ValidatedRow::invalid(row, errors)
            }
            Err(_) => {
                warn!(
                    row = row.row_number,
                    timeout_ms = self.row_timeout.as_millis() as u64,
                    "Row validation timed out"
                );
                let error = ValidationError::new(
                    row.row_number,
                    FIELD_ROW,
                    ErrorKind::TransientStoreError,
                    format!(
                        "Validation timed out after {}ms; retry the import",
                        self.row_timeout.as_millis()
                    ),
                );
                ValidatedRow::invalid(row, vec![error])
            }
        }
    }

    async fn check(&self, row: &ImportRow) -> Result<ResolvedRow, Vec<ValidationError>> {
        let n = row.row_number;
        let mut errors = Vec::new();

        // Structural checks
        let name = cell(&row.name);
        if name.is_none() {
            errors.push(missing(n, FIELD_NAME));
        }

        let raw_position = cell(&row.position);
        if raw_position.is_none() {
            errors.push(missing(n, FIELD_POSITION));
        }

        let kind = match cell(&row.jurisdiction_type) {
            None => {
                errors.push(missing(n, FIELD_JURISDICTION_TYPE));
                None
            }
            Some(raw) => match raw.parse::<JurisdictionKind>() {
                Ok(kind) => Some(kind),
                Err(message) => {
                    errors.push(
                        ValidationError::new(n, FIELD_JURISDICTION_TYPE, ErrorKind::FieldValidation, message)
                            .with_raw_value(Some(raw))
                            .with_suggestions(
                                JurisdictionKind::ALL.iter().map(|k| k.to_string()).collect(),
                            ),
                    );
                    None
                }
            },
        };

        let jurisdiction_name = cell(&row.jurisdiction_name);
        if jurisdiction_name.is_none() && kind != Some(JurisdictionKind::National) {
            errors.push(missing(n, FIELD_JURISDICTION_NAME));
        }

        let term_start = self.date(n, FIELD_TERM_START, &row.term_start, true, &mut errors);
        let term_end = self.date(n, FIELD_TERM_END, &row.term_end, false, &mut errors);
        if let (Some(start), Some(end)) = (term_start, term_end) {
            if end < start {
                errors.push(
                    ValidationError::new(
                        n,
                        FIELD_TERM_END,
                        ErrorKind::FieldValidation,
                        format!("Term end {} is before term start {}", end, start),
                    )
                    .with_raw_value(row.term_end.as_deref()),
                );
            }
        }

        // Resolution; the lookups are independent
        let position_fut = async {
            match raw_position {
                Some(raw) => Some(self.positions.resolve(raw).await),
                None => None,
            }
        };
        let jurisdiction_fut = async {
            match (kind, jurisdiction_name) {
                (Some(JurisdictionKind::National), _) => Some(Ok(Jurisdiction::National)),
                (Some(kind), Some(name)) => Some(
                    self.jurisdictions
                        .resolve(kind, name, cell(&row.parent_jurisdiction))
                        .await,
                ),
                _ => None,
            }
        };
        let party_fut = self.parties.resolve(cell(&row.party));
        let politician_fut = async {
            match name {
                Some(name) => Some(self.politician(name).await),
                None => None,
            }
        };
        let (position, jurisdiction, party, politician) =
            tokio::join!(position_fut, jurisdiction_fut, party_fut, politician_fut);

        let position: Option<Position> = match position {
            Some(Ok(p)) => Some(p),
            Some(Err(e)) => {
                errors.push(resolution_error(n, FIELD_POSITION, row.position.as_deref(), "position", e));
                None
            }
            None => None,
        };

        let jurisdiction: Option<Jurisdiction> = match jurisdiction {
            Some(Ok(j)) => Some(j),
            Some(Err(e)) => {
                let mut error = resolution_error(
                    n,
                    FIELD_JURISDICTION_NAME,
                    row.jurisdiction_name.as_deref(),
                    "jurisdiction",
                    e,
                );
                if error.kind == ErrorKind::ResolutionAmbiguous {
                    error.message = format!(
                        "{}; fill in {} to disambiguate",
                        error.message, FIELD_PARENT_JURISDICTION
                    );
                }
                errors.push(error);
                None
            }
            None => None,
        };

        let party: Option<Party> = match party {
            Ok(p) => p,
            Err(e) => {
                errors.push(resolution_error(n, FIELD_PARTY, row.party.as_deref(), "party", e));
                None
            }
        };

        let politician: Option<PoliticianRef> = match politician {
            Some(Ok(p)) => Some(p),
            Some(Err(e)) => {
                errors.push(resolution_error(n, FIELD_NAME, row.name.as_deref(), "politician", e));
                None
            }
            None => None,
        };

        // Level cross-check
        if let (Some(position), Some(jurisdiction), Some(raw)) = (&position, &jurisdiction, raw_position)
        {
            if !position.accepts(jurisdiction.kind()) {
                errors.push(self.level_mismatch(n, raw, position, jurisdiction.kind()).await);
            }
        }

        match (politician, position, jurisdiction, term_start) {
            (Some(politician), Some(position), Some(jurisdiction), Some(term_start))
                if errors.is_empty() =>
            {
                Ok(ResolvedRow {
                    politician,
                    position,
                    jurisdiction,
                    party,
                    term_start,
                    term_end,
                })
            }
            _ => Err(errors),
        }
    }

    fn date(
        &self,
        row_number: usize,
        field: &str,
        value: &Option<String>,
        required: bool,
        errors: &mut Vec<ValidationError>,
    ) -> Option<NaiveDate> {
        let raw = match cell(value) {
            Some(raw) => raw,
            None => {
                if required {
                    errors.push(missing(row_number, field));
                }
                return None;
            }
        };

        let parsed = parse_term_date(raw, &self.date_formats);
        if parsed.is_none() {
            errors.push(
                ValidationError::new(
                    row_number,
                    field,
                    ErrorKind::FieldValidation,
                    format!(
                        "'{}' is not a date (accepted formats: {})",
                        raw,
                        self.date_formats.join(", ")
                    ),
                )
                .with_raw_value(Some(raw)),
            );
        }
        parsed
    }

    async fn politician(&self, name: &str) -> Result<PoliticianRef, ResolutionError> {
        let mut matches = self.politicians.find_by_name(name).await?;
        match matches.len() {
            0 => Ok(PoliticianRef::New {
                name: name.split_whitespace().collect::<Vec<_>>().join(" "),
            }),
            1 => Ok(PoliticianRef::Existing {
                id: matches.remove(0).id,
            }),
            _ => Err(ResolutionError::Ambiguous {
                query: name_key(name),
                candidates: matches
                    .iter()
                    .map(|p| format!("{} ({})", p.name, p.id))
                    .collect(),
            }),
        }
    }

    /// Blame the position when a compatible title looks like what was typed,
    /// otherwise the jurisdiction type
    async fn level_mismatch(
        &self,
        row_number: usize,
        raw_position: &str,
        position: &Position,
        kind: JurisdictionKind,
    ) -> ValidationError {
        let alternatives: Vec<String> = self
            .positions
            .suggest_compatible(raw_position, kind)
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|label| *label != position.name)
            .collect();

        if !alternatives.is_empty() {
            return ValidationError::new(
                row_number,
                FIELD_POSITION,
                ErrorKind::FieldValidation,
                format!(
                    "{} is a {} position and cannot be held in a {} jurisdiction",
                    position.name, position.level, kind
                ),
            )
            .with_raw_value(Some(raw_position))
            .with_suggestions(alternatives);
        }

        let compatible: Vec<String> = position
            .compatible_jurisdictions()
            .iter()
            .map(|k| k.to_string())
            .collect();
        ValidationError::new(
            row_number,
            FIELD_JURISDICTION_TYPE,
            ErrorKind::FieldValidation,
            format!(
                "{} requires a {} jurisdiction, not {}",
                position.name,
                compatible.join(" or "),
                kind
            ),
        )
        .with_raw_value(Some(kind.as_str()))
        .with_suggestions(compatible)
    }
}

fn missing(row_number: usize, field: &str) -> ValidationError {
    ValidationError::new(
        row_number,
        field,
        ErrorKind::FieldValidation,
        format!("{} is required", field),
    )
}

fn resolution_error(
    row_number: usize,
    field: &str,
    raw: Option<&str>,
    what: &str,
    err: ResolutionError,
) -> ValidationError {
    match err {
        ResolutionError::NotFound { query, suggestions } => ValidationError::new(
            row_number,
            field,
            ErrorKind::ResolutionNotFound,
            format!("No {} matches '{}'", what, query),
        )
        .with_raw_value(raw)
        .with_suggestions(suggestions),
        ResolutionError::Ambiguous { query, candidates } => ValidationError::new(
            row_number,
            field,
            ErrorKind::ResolutionAmbiguous,
            format!("'{}' matches {} {} records", query, candidates.len(), what),
        )
        .with_raw_value(raw)
        .with_suggestions(candidates),
        ResolutionError::Directory(e) => {
            warn!(row = row_number, field, error = %e, "Directory lookup failed");
            ValidationError::new(
                row_number,
                field,
                ErrorKind::TransientStoreError,
                format!("Lookup failed: {}", e),
            )
            .with_raw_value(raw)
        }
    }
}
