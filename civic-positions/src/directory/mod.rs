//! Read-only directories of reference data
//!
//! Owned by the administrative layer. The import path only reads them, except
//! for creating politicians, which happens inside the row's commit
//! transaction (see `db::politicians`).

#[cfg(test)]
pub(crate) mod memory;

use async_trait::async_trait;
use civic_common::Result;
use std::sync::Arc;

use crate::models::{JurisdictionKind, JurisdictionRecord, Party, Politician, Position};

/// Canonical jurisdictions (regions, provinces, cities, barangays, districts)
#[async_trait]
pub trait JurisdictionDirectory: Send + Sync {
    /// Case-insensitive exact name lookup within one kind
    ///
    /// With `parent_hint`, only records whose enclosing jurisdiction has that
    /// name are returned. National is never looked up.
    async fn lookup(
        &self,
        kind: JurisdictionKind,
        name: &str,
        parent_hint: Option<&str>,
    ) -> Result<Vec<JurisdictionRecord>>;
}

#[async_trait]
pub trait PositionDirectory: Send + Sync {
    /// Case-insensitive exact match on name or slug
    async fn find_by_name(&self, name: &str) -> Result<Vec<Position>>;

    async fn list_all(&self) -> Result<Vec<Position>>;
}

#[async_trait]
pub trait PartyDirectory: Send + Sync {
    /// Case-insensitive exact match on name or abbreviation
    async fn find_by_name(&self, name: &str) -> Result<Vec<Party>>;

    async fn list_all(&self) -> Result<Vec<Party>>;
}

#[async_trait]
pub trait PoliticianDirectory: Send + Sync {
    /// Case- and whitespace-insensitive exact name match
    async fn find_by_name(&self, name: &str) -> Result<Vec<Politician>>;
}

/// The four directories a row validator reads from
#[derive(Clone)]
pub struct Directories {
    pub jurisdictions: Arc<dyn JurisdictionDirectory>,
    pub positions: Arc<dyn PositionDirectory>,
    pub parties: Arc<dyn PartyDirectory>,
    pub politicians: Arc<dyn PoliticianDirectory>,
}

impl Directories {
    /// All four backed by one value (e.g. the SQLite directory)
    pub fn shared<D>(directory: Arc<D>) -> Self
    where
        D: JurisdictionDirectory
            + PositionDirectory
            + PartyDirectory
            + PoliticianDirectory
            + 'static,
    {
        Self {
            jurisdictions: directory.clone(),
            positions: directory.clone(),
            parties: directory.clone(),
            politicians: directory,
        }
    }
}
