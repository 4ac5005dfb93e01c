//! Party resolution
//!
//! A blank party is valid (independent). Only a non-empty name that matches
//! nothing is an error.

use std::sync::Arc;

use super::fuzzy::{normalize, rank_suggestions, suggestion_labels, FuzzyCandidate};
use super::ResolutionError;
use crate::directory::PartyDirectory;
use crate::models::Party;

pub struct PartyResolver {
    directory: Arc<dyn PartyDirectory>,
    threshold: f64,
    limit: usize,
}

impl PartyResolver {
    pub fn new(directory: Arc<dyn PartyDirectory>, threshold: f64, limit: usize) -> Self {
        Self {
            directory,
            threshold,
            limit,
        }
    }

    pub async fn resolve(&self, raw: Option<&str>) -> Result<Option<Party>, ResolutionError> {
        let query = match raw.map(str::trim) {
            Some(q) if !q.is_empty() => q,
            _ => return Ok(None),
        };

        let mut exact = self.directory.find_by_name(query).await?;
        exact.dedup_by(|a, b| a.id == b.id);
        match exact.len() {
            0 => {}
            1 => return Ok(exact.pop()),
            _ => {
                return Err(ResolutionError::Ambiguous {
                    query: query.to_string(),
                    candidates: exact.iter().map(label).collect(),
                })
            }
        }

        let all = self.directory.list_all().await?;
        let key = normalize(query);
        let mut normalized: Vec<&Party> = all
            .iter()
            .filter(|p| {
                normalize(&p.name) == key
                    || p.abbreviation.as_deref().is_some_and(|a| normalize(a) == key)
            })
            .collect();
        if normalized.len() == 1 {
            return Ok(normalized.pop().cloned());
        }

        let candidates: Vec<FuzzyCandidate> = all
            .iter()
            .map(|p| {
                let mut keys = vec![p.name.clone()];
                keys.extend(p.abbreviation.clone());
                FuzzyCandidate::new(label(p), keys)
            })
            .collect();
        Err(ResolutionError::NotFound {
            query: query.to_string(),
            suggestions: suggestion_labels(rank_suggestions(
                query,
                &candidates,
                self.threshold,
                self.limit,
            )),
        })
    }
}

/// "Name (ABBR)", or just the name
fn label(party: &Party) -> String {
    match &party.abbreviation {
        Some(abbr) if !abbr.is_empty() => format!("{} ({})", party.name, abbr),
        _ => party.name.clone(),
    }
}
