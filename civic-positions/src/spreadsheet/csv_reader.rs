//! Delimited-text row reader

use serde::Deserialize;

use super::RowReader;
use crate::error::ImportError;
use crate::models::import_row::{
    FIELD_JURISDICTION_NAME, FIELD_JURISDICTION_TYPE, FIELD_NAME, FIELD_PARENT_JURISDICTION,
    FIELD_PARTY, FIELD_POSITION, FIELD_TERM_END, FIELD_TERM_START,
};
use crate::models::ImportRow;

/// Header spellings accepted for each column, after lowercasing and turning
/// spaces and hyphens into underscores
const COLUMN_ALIASES: &[(&str, &[&str])] = &[
    (FIELD_NAME, &["name", "full_name", "politician", "politician_name", "candidate"]),
    (FIELD_POSITION, &["position", "title", "office", "position_title"]),
    (FIELD_JURISDICTION_TYPE, &["jurisdiction_type", "jurisdiction_level", "level"]),
    (FIELD_JURISDICTION_NAME, &["jurisdiction_name", "jurisdiction", "location", "area"]),
    (FIELD_PARENT_JURISDICTION, &["parent_jurisdiction", "parent", "within"]),
    (FIELD_PARTY, &["party", "party_name", "affiliation"]),
    (FIELD_TERM_START, &["term_start", "start_date", "term_start_date", "from"]),
    (FIELD_TERM_END, &["term_end", "end_date", "term_end_date", "to"]),
];

/// Columns a file must carry
const REQUIRED_COLUMNS: &[&str] = &[
    FIELD_NAME,
    FIELD_POSITION,
    FIELD_JURISDICTION_TYPE,
    FIELD_JURISDICTION_NAME,
    FIELD_TERM_START,
];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Deserialize)]
struct CsvImportRow {
    name: Option<String>,
    position: Option<String>,
    jurisdiction_type: Option<String>,
    jurisdiction_name: Option<String>,
    parent_jurisdiction: Option<String>,
    party: Option<String>,
    term_start: Option<String>,
    term_end: Option<String>,
}

/// Reads comma- or semicolon-delimited text with a header row
///
/// Unknown columns are ignored, so an exported error report (which adds
/// `row`, `errors` and `suggestions`) can be corrected and uploaded again.
#[derive(Debug, Clone, Default)]
pub struct CsvRowReader {
    delimiter: Option<u8>,
}

impl CsvRowReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the delimiter instead of detecting it from the header line
    pub fn with_delimiter(delimiter: u8) -> Self {
        Self {
            delimiter: Some(delimiter),
        }
    }

    fn detect_delimiter(&self, bytes: &[u8]) -> u8 {
        if let Some(d) = self.delimiter {
            return d;
        }
        let header = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
        let count = |d: u8| header.iter().filter(|b| **b == d).count();
        if count(b';') > count(b',') {
            b';'
        } else if count(b'\t') > count(b',') {
            b'\t'
        } else {
            b','
        }
    }
}

/// Canonical column name for a header cell, if it is one we know
fn canonical_column(header: &str) -> Option<&'static str> {
    let key = header
        .trim()
        .to_lowercase()
        .replace([' ', '-'], "_");
    COLUMN_ALIASES
        .iter()
        .find(|(_, aliases)| aliases.contains(&key.as_str()))
        .map(|(field, _)| *field)
}

impl RowReader for CsvRowReader {
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError> {
        let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ImportError::MalformedFile("file is empty".to_string()));
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.detect_delimiter(bytes))
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(bytes);

        let headers = reader
            .headers()
            .map_err(|e| ImportError::MalformedFile(format!("unreadable header row: {}", e)))?
            .clone();

        // Rename known headers to their canonical names; keep the rest as-is
        let mut seen = Vec::new();
        let canonical: csv::StringRecord = headers
            .iter()
            .map(|h| match canonical_column(h) {
                Some(field) if !seen.contains(&field) => {
                    seen.push(field);
                    field.to_string()
                }
                _ => h.to_string(),
            })
            .collect();

        let missing: Vec<&str> = REQUIRED_COLUMNS
            .iter()
            .copied()
            .filter(|c| !seen.contains(c))
            .collect();
        if !missing.is_empty() {
            return Err(ImportError::MalformedFile(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        reader.set_headers(canonical);

        let mut rows = Vec::new();
        for (index, result) in reader.deserialize::<CsvImportRow>().enumerate() {
            // Header is spreadsheet row 1
            let row_number = index + 2;
            let record = result.map_err(|e| {
                ImportError::MalformedFile(format!("row {} could not be read: {}", row_number, e))
            })?;
            let row = ImportRow {
                row_number,
                name: record.name,
                position: record.position,
                jurisdiction_type: record.jurisdiction_type,
                jurisdiction_name: record.jurisdiction_name,
                parent_jurisdiction: record.parent_jurisdiction,
                party: record.party,
                term_start: record.term_start,
                term_end: record.term_end,
            };
            if !row.is_blank() {
                rows.push(row);
            }
        }

        if rows.is_empty() {
            return Err(ImportError::MalformedFile("file contains no data rows".to_string()));
        }

        tracing::debug!(rows = rows.len(), "Rows read from delimited file");
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Result<Vec<ImportRow>, ImportError> {
        CsvRowReader::new().read_rows(text.as_bytes())
    }

    #[test]
    fn test_reads_rows_with_spreadsheet_numbering() {
        let rows = read(
            "name,position,jurisdiction_type,jurisdiction_name,party,term_start,term_end\n\
             Ana Reyes,Governor,province,Ilocos Norte,LP,2022-06-30,\n\
             Ben Cruz , Mayor ,city,Laoag,,2022-06-30,2025-06-30\n",
        )
        .unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].row_number, 2);
        assert_eq!(rows[0].party.as_deref(), Some("LP"));
        assert_eq!(rows[0].term_end, None);
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(rows[1].name.as_deref(), Some("Ben Cruz"));
        assert_eq!(rows[1].position.as_deref(), Some("Mayor"));
        assert_eq!(rows[1].party, None);
    }

    #[test]
    fn test_header_aliases_and_extra_columns() {
        let rows = read(
            "row,Full Name,Title,Jurisdiction Level,Jurisdiction,Start Date,errors,suggestions\n\
             2,Ana Reyes,Governor,province,Ilocos Norte,2022-06-30,\"position: bad\",\n",
        )
        .unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("Ana Reyes"));
        assert_eq!(rows[0].jurisdiction_type.as_deref(), Some("province"));
        assert_eq!(rows[0].term_start.as_deref(), Some("2022-06-30"));
    }

    #[test]
    fn test_semicolon_delimiter_detected() {
        let rows = read(
            "name;position;jurisdiction_type;jurisdiction_name;term_start\n\
             Ana Reyes;Governor;province;Ilocos Norte;2022-06-30\n",
        )
        .unwrap();
        assert_eq!(rows[0].jurisdiction_name.as_deref(), Some("Ilocos Norte"));
    }

    #[test]
    fn test_blank_rows_skipped_but_numbering_kept() {
        let rows = read(
            "name,position,jurisdiction_type,jurisdiction_name,term_start\n\
             ,,,,\n\
             Ana Reyes,Governor,province,Ilocos Norte,2022-06-30\n",
        )
        .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].row_number, 3);
    }

    #[test]
    fn test_bom_is_ignored() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice(
            b"name,position,jurisdiction_type,jurisdiction_name,term_start\nA,B,national,,2022-01-01\n",
        );
        let rows = CsvRowReader::new().read_rows(&bytes).unwrap();
        assert_eq!(rows[0].name.as_deref(), Some("A"));
    }

    #[test]
    fn test_malformed_inputs() {
        assert!(matches!(read(""), Err(ImportError::MalformedFile(_))));
        assert!(matches!(
            read("name,position\nAna,Governor\n"),
            Err(ImportError::MalformedFile(msg)) if msg.contains("jurisdiction_type")
        ));
        assert!(matches!(
            read("name,position,jurisdiction_type,jurisdiction_name,term_start\n"),
            Err(ImportError::MalformedFile(_))
        ));

        let mut invalid = b"name,position,jurisdiction_type,jurisdiction_name,term_start\n".to_vec();
        invalid.extend_from_slice(b"\xFF\xFE,Governor,province,X,2022-01-01\n");
        assert!(matches!(
            CsvRowReader::new().read_rows(&invalid),
            Err(ImportError::MalformedFile(_))
        ));
    }
}
