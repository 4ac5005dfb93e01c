//! Fuzzy name matching
//!
//! Pure functions over `(query, candidates)`; no storage access. Scores are in
//! `0.0..=1.0` and combine edit distance with token overlap so both typos
//! ("Govenor") and reordered or partial titles ("Governor, Provincial") rank.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Weight applied to the overlap coefficient so a subset match never ties
/// with an exact spelling.
const OVERLAP_WEIGHT: f64 = 0.85;

/// Something that can be suggested, matched through one or more keys
#[derive(Debug, Clone, PartialEq)]
pub struct FuzzyCandidate {
    /// Text shown to the importer
    pub label: String,
    /// Strings compared against the query (name, slug, abbreviation, ...)
    pub keys: Vec<String>,
}

impl FuzzyCandidate {
    pub fn new(label: impl Into<String>, keys: Vec<String>) -> Self {
        Self {
            label: label.into(),
            keys,
        }
    }
}

/// A ranked suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSuggestion {
    pub label: String,
    pub score: f64,
}

/// Lowercase, turn punctuation into spaces, collapse whitespace
pub fn normalize(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

fn tokens(normalized: &str) -> HashSet<&str> {
    normalized.split(' ').filter(|t| !t.is_empty()).collect()
}

/// Similarity of two strings after normalization
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = normalize(a);
    let b = normalize(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }

    let edit = strsim::normalized_levenshtein(&a, &b);

    let ta = tokens(&a);
    let tb = tokens(&b);
    let shared = ta.intersection(&tb).count() as f64;
    let jaccard = shared / ta.union(&tb).count() as f64;
    let overlap = shared / ta.len().min(tb.len()) as f64 * OVERLAP_WEIGHT;

    edit.max(jaccard).max(overlap)
}

/// Rank candidates against `query`
///
/// Keeps candidates scoring at least `threshold`, best first (ties broken by
/// label), at most `limit` of them.
pub fn rank_suggestions(
    query: &str,
    candidates: &[FuzzyCandidate],
    threshold: f64,
    limit: usize,
) -> Vec<ScoredSuggestion> {
    let mut scored: Vec<ScoredSuggestion> = candidates
        .iter()
        .filter_map(|candidate| {
            let score = candidate
                .keys
                .iter()
                .map(|key| similarity(query, key))
                .fold(0.0_f64, f64::max);
            (score >= threshold).then(|| ScoredSuggestion {
                label: candidate.label.clone(),
                score,
            })
        })
        .collect();

    scored.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.label.cmp(&b.label))
    });
    scored.dedup_by(|a, b| a.label == b.label);
    scored.truncate(limit);
    scored
}

/// Labels of the ranked suggestions
pub fn suggestion_labels(suggestions: Vec<ScoredSuggestion>) -> Vec<String> {
    suggestions.into_iter().map(|s| s.label).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> Vec<FuzzyCandidate> {
        [
            "Governor",
            "Vice Governor",
            "Mayor",
            "Vice Mayor",
            "City Councilor",
            "Provincial Board Member",
            "Punong Barangay",
        ]
        .iter()
        .map(|name| FuzzyCandidate::new(*name, vec![name.to_string()]))
        .collect()
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  Vice-Governor "), "vice governor");
        assert_eq!(normalize("Sangguniang  Panlalawigan, Member"), "sangguniang panlalawigan member");
        assert_eq!(normalize("..."), "");
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("Mayor", "mayor"), 1.0);
        assert_eq!(similarity("", "Mayor"), 0.0);
        let s = similarity("Govenor", "Governor");
        assert!(s > 0.8 && s < 1.0, "score was {}", s);
    }

    #[test]
    fn test_typo_ranks_intended_position_first() {
        let ranked = rank_suggestions("Govenor", &positions(), 0.6, 5);
        assert_eq!(ranked[0].label, "Governor");
        assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_threshold_and_limit() {
        let ranked = rank_suggestions("Zzzz", &positions(), 0.6, 5);
        assert!(ranked.is_empty());

        let ranked = rank_suggestions("Vice", &positions(), 0.1, 2);
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_token_reordering_matches() {
        let ranked = rank_suggestions("Board Member Provincial", &positions(), 0.6, 5);
        assert_eq!(ranked[0].label, "Provincial Board Member");
    }

    #[test]
    fn test_multiple_keys_use_best_score() {
        let parties = vec![FuzzyCandidate::new(
            "Nacionalista Party (NP)",
            vec!["Nacionalista Party".to_string(), "NP".to_string()],
        )];
        let ranked = rank_suggestions("np", &parties, 0.6, 5);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].score, 1.0);
    }
}
