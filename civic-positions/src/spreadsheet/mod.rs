//! Tabular input and output
//!
//! Workbooks reach this crate already exported to delimited text; the reader
//! turns that into raw `ImportRow`s and nothing more.

pub mod csv_reader;
pub mod error_report;

pub use csv_reader::CsvRowReader;
pub use error_report::build_error_report;

use crate::error::ImportError;
use crate::models::ImportRow;

/// Source of raw import rows
pub trait RowReader: Send + Sync {
    /// Parse every non-blank data row
    ///
    /// Fails with `MalformedFile` when the input cannot be read as a table
    /// with the required columns; row content is never judged here.
    fn read_rows(&self, bytes: &[u8]) -> Result<Vec<ImportRow>, ImportError>;
}
