//! Jurisdiction resolution
//!
//! National short-circuits without a lookup. Every other kind is an exact
//! case-insensitive name match inside that kind's table; more than one match
//! is reported as ambiguous, never resolved to the first hit.

use std::sync::Arc;

use super::ResolutionError;
use crate::directory::JurisdictionDirectory;
use crate::models::{Jurisdiction, JurisdictionKind};

pub struct JurisdictionResolver {
    directory: Arc<dyn JurisdictionDirectory>,
}

impl JurisdictionResolver {
    pub fn new(directory: Arc<dyn JurisdictionDirectory>) -> Self {
        Self { directory }
    }

    pub async fn resolve(
        &self,
        kind: JurisdictionKind,
        name: &str,
        parent_hint: Option<&str>,
    ) -> Result<Jurisdiction, ResolutionError> {
        if kind == JurisdictionKind::National {
            return Ok(Jurisdiction::National);
        }

        let name = name.trim();
        let parent_hint = parent_hint.map(str::trim).filter(|h| !h.is_empty());
        let mut matches = self.directory.lookup(kind, name, parent_hint).await?;

        match matches.len() {
            0 => {
                tracing::debug!(kind = %kind, name, ?parent_hint, "Jurisdiction not found");
                Err(ResolutionError::NotFound {
                    query: name.to_string(),
                    suggestions: Vec::new(),
                })
            }
            1 => Ok(matches.remove(0).jurisdiction),
            _ => {
                let mut candidates: Vec<String> = matches.iter().map(|r| r.label()).collect();
                candidates.sort();
                tracing::debug!(kind = %kind, name, count = candidates.len(), "Ambiguous jurisdiction");
                Err(ResolutionError::Ambiguous {
                    query: name.to_string(),
                    candidates,
                })
            }
        }
    }
}
