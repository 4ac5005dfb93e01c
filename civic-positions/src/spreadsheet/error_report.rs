//! Downloadable error report
//!
//! Same columns as an import file, one line per failed row, plus the
//! problems found in it. Fix the cells, delete the three annotation columns
//! (or leave them; the reader ignores them) and upload again.

use civic_common::{Error, Result};
use std::collections::BTreeMap;

use crate::models::import_row::{
    FIELD_JURISDICTION_NAME, FIELD_JURISDICTION_TYPE, FIELD_NAME, FIELD_PARENT_JURISDICTION,
    FIELD_PARTY, FIELD_POSITION, FIELD_ROW, FIELD_TERM_END, FIELD_TERM_START,
};
use crate::models::{ImportRow, ValidationError};

/// Input columns in report order
pub const INPUT_COLUMNS: [&str; 8] = [
    FIELD_NAME,
    FIELD_POSITION,
    FIELD_JURISDICTION_TYPE,
    FIELD_JURISDICTION_NAME,
    FIELD_PARENT_JURISDICTION,
    FIELD_PARTY,
    FIELD_TERM_START,
    FIELD_TERM_END,
];

pub const ERRORS_COLUMN: &str = "errors";
pub const SUGGESTIONS_COLUMN: &str = "suggestions";

/// Render failed rows and their errors as CSV
///
/// Rows are ordered by row number. The `errors` cell holds one
/// `field: message` line per error; `suggestions` holds one
/// `field: a; b; c` line per error that carries suggestions.
pub fn build_error_report(rows: &[ImportRow], errors: &[ValidationError]) -> Result<Vec<u8>> {
    let mut by_row: BTreeMap<usize, (Option<&ImportRow>, Vec<&ValidationError>)> = BTreeMap::new();
    for row in rows {
        by_row.entry(row.row_number).or_default().0 = Some(row);
    }
    for error in errors {
        by_row.entry(error.row_number).or_default().1.push(error);
    }

    let mut writer = csv::Writer::from_writer(Vec::new());
    let header = std::iter::once(FIELD_ROW)
        .chain(INPUT_COLUMNS)
        .chain([ERRORS_COLUMN, SUGGESTIONS_COLUMN]);
    writer.write_record(header).map_err(report_error)?;

    for (row_number, (row, row_errors)) in by_row {
        let mut record = vec![row_number.to_string()];
        record.extend(
            INPUT_COLUMNS
                .iter()
                .map(|column| row.and_then(|r| r.field(column)).unwrap_or_default().to_string()),
        );

        let messages: Vec<String> = row_errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        let suggestions: Vec<String> = row_errors
            .iter()
            .filter(|e| !e.suggestions.is_empty())
            .map(|e| format!("{}: {}", e.field, e.suggestions.join("; ")))
            .collect();
        record.push(messages.join("\n"));
        record.push(suggestions.join("\n"));

        writer.write_record(&record).map_err(report_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| Error::Internal(format!("Failed to finish error report: {}", e)))
}

fn report_error(e: csv::Error) -> Error {
    Error::Internal(format!("Failed to write error report: {}", e))
}
