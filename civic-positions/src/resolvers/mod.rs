//! Free-text to canonical record resolution
//!
//! Resolution is read-only and may run concurrently across rows.

pub mod fuzzy;
pub mod jurisdiction;
pub mod party;
pub mod position;

pub use jurisdiction::JurisdictionResolver;
pub use party::PartyResolver;
pub use position::PositionResolver;

use thiserror::Error;

/// Why a free-text value could not be resolved
#[derive(Debug, Error)]
pub enum ResolutionError {
    /// Zero matches; `suggestions` are never applied automatically
    #[error("no match for '{query}'")]
    NotFound {
        query: String,
        suggestions: Vec<String>,
    },

    /// More than one record matched
    #[error("'{query}' matches {} records", candidates.len())]
    Ambiguous {
        query: String,
        candidates: Vec<String>,
    },

    /// Directory lookup failed
    #[error(transparent)]
    Directory(#[from] civic_common::Error),
}

/// Lowercase with internal whitespace collapsed; the identity key for names
pub fn name_key(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_name_key_folds_case_and_spacing() {
        assert_eq!(name_key("  Juan   DELA Cruz "), "juan dela cruz");
        assert_eq!(name_key("Juan dela Cruz"), name_key("juan  dela\tcruz"));
    }

    #[test]
    fn test_ambiguous_message_counts_candidates() {
        let err = ResolutionError::Ambiguous {
            query: "San Jose".to_string(),
            candidates: vec!["San Jose (A)".to_string(), "San Jose (B)".to_string()],
        };
        assert_eq!(err.to_string(), "'San Jose' matches 2 records");
    }
}
