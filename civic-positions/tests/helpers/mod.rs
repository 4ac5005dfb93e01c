//! Test Helper Utilities
//!
//! Shared utilities for civic-positions integration tests

pub mod db_utils;
pub mod spreadsheet;

// Re-export commonly used items
pub use db_utils::{create_test_db, create_test_pipeline, seed_reference_data, SeedData};
pub use spreadsheet::{csv_file, HEADER};
