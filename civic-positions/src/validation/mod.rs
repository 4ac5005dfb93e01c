//! Row validation

pub mod dates;
pub mod row_validator;

pub use row_validator::RowValidator;
