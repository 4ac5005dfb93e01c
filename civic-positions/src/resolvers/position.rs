//! Position title resolution
//!
//! Exact name/slug match, then a punctuation- and spacing-insensitive match,
//! then fuzzy suggestions. A suggestion is never returned as the resolved
//! position.

use std::sync::Arc;

use super::fuzzy::{normalize, rank_suggestions, suggestion_labels, FuzzyCandidate};
use super::ResolutionError;
use crate::directory::PositionDirectory;
use crate::models::{JurisdictionKind, Position};

pub struct PositionResolver {
    directory: Arc<dyn PositionDirectory>,
    threshold: f64,
    limit: usize,
}

impl PositionResolver {
    pub fn new(directory: Arc<dyn PositionDirectory>, threshold: f64, limit: usize) -> Self {
        Self {
            directory,
            threshold,
            limit,
        }
    }

    pub async fn resolve(&self, raw: &str) -> Result<Position, ResolutionError> {
        let query = raw.trim();

        let exact = self.directory.find_by_name(query).await?;
        if let Some(found) = single(query, exact)? {
            return Ok(found);
        }

        let all = self.directory.list_all().await?;
        let key = normalize(query);
        let normalized: Vec<Position> = all
            .iter()
            .filter(|p| !key.is_empty() && (normalize(&p.name) == key || normalize(&p.slug) == key))
            .cloned()
            .collect();
        if let Some(found) = single(query, normalized)? {
            tracing::debug!(query, position = %found.name, "Position matched after normalization");
            return Ok(found);
        }

        let candidates: Vec<FuzzyCandidate> = all.iter().map(candidate).collect();
        let suggestions =
            suggestion_labels(rank_suggestions(query, &candidates, self.threshold, self.limit));
        Err(ResolutionError::NotFound {
            query: query.to_string(),
            suggestions,
        })
    }

    /// Positions that may be held in `kind`, ranked by similarity to `raw`
    pub async fn suggest_compatible(
        &self,
        raw: &str,
        kind: JurisdictionKind,
    ) -> Result<Vec<String>, ResolutionError> {
        let candidates: Vec<FuzzyCandidate> = self
            .directory
            .list_all()
            .await?
            .iter()
            .filter(|p| p.accepts(kind))
            .map(candidate)
            .collect();
        Ok(suggestion_labels(rank_suggestions(
            raw.trim(),
            &candidates,
            self.threshold,
            self.limit,
        )))
    }
}

fn candidate(position: &Position) -> FuzzyCandidate {
    FuzzyCandidate::new(
        position.name.clone(),
        vec![position.name.clone(), position.slug.clone()],
    )
}

/// Zero matches → None, one → Some, several → Ambiguous
fn single(query: &str, mut matches: Vec<Position>) -> Result<Option<Position>, ResolutionError> {
    matches.dedup_by(|a, b| a.id == b.id);
    match matches.len() {
        0 => Ok(None),
        1 => Ok(matches.pop()),
        _ => {
            let mut candidates: Vec<String> = matches.into_iter().map(|p| p.name).collect();
            candidates.sort();
            Err(ResolutionError::Ambiguous {
                query: query.to_string(),
                candidates,
            })
        }
    }
}
