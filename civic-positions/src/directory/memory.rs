//! In-memory directories for unit tests

use async_trait::async_trait;
use civic_common::Result;
use std::time::Duration;
use uuid::Uuid;

use super::{JurisdictionDirectory, PartyDirectory, PoliticianDirectory, PositionDirectory};
use crate::models::{
    Branch, Jurisdiction, JurisdictionKind, JurisdictionRecord, Party, Politician, Position,
    PositionLevel,
};
use crate::resolvers::{fuzzy::normalize, name_key};

#[derive(Default)]
pub(crate) struct MemoryDirectory {
    pub jurisdictions: Vec<JurisdictionRecord>,
    pub positions: Vec<Position>,
    pub parties: Vec<Party>,
    pub politicians: Vec<Politician>,
    /// Every jurisdiction lookup sleeps this long
    pub lookup_delay: Option<Duration>,
}

impl MemoryDirectory {
    pub fn with_position(mut self, name: &str, level: PositionLevel, branch: Branch) -> Self {
        self.positions.push(Position {
            id: Uuid::new_v4(),
            name: name.to_string(),
            slug: normalize(name).replace(' ', "-"),
            level,
            branch,
            term_years: 3,
            max_terms: Some(3),
            is_elected: true,
        });
        self
    }

    pub fn with_party(mut self, name: &str, abbreviation: &str) -> Self {
        self.parties.push(Party {
            id: Uuid::new_v4(),
            name: name.to_string(),
            abbreviation: Some(abbreviation.to_string()),
            color: None,
        });
        self
    }

    pub fn with_jurisdiction(mut self, kind: JurisdictionKind, name: &str, parent: Option<&str>) -> Self {
        let jurisdiction = match Jurisdiction::from_parts(kind, Some(Uuid::new_v4())) {
            Ok(j) => j,
            Err(e) => panic!("{}", e),
        };
        self.jurisdictions.push(JurisdictionRecord {
            jurisdiction,
            name: name.to_string(),
            parent_name: parent.map(str::to_string),
        });
        self
    }

    pub fn with_politician(mut self, name: &str) -> Self {
        self.politicians.push(Politician {
            id: Uuid::new_v4(),
            name: name.to_string(),
        });
        self
    }

    pub fn position(&self, name: &str) -> &Position {
        self.positions
            .iter()
            .find(|p| p.name == name)
            .unwrap_or_else(|| panic!("no position {}", name))
    }
}

fn same(a: &str, b: &str) -> bool {
    name_key(a) == name_key(b)
}

#[async_trait]
impl JurisdictionDirectory for MemoryDirectory {
    async fn lookup(
        &self,
        kind: JurisdictionKind,
        name: &str,
        parent_hint: Option<&str>,
    ) -> Result<Vec<JurisdictionRecord>> {
        if let Some(delay) = self.lookup_delay {
            tokio::time::sleep(delay).await;
        }
        Ok(self
            .jurisdictions
            .iter()
            .filter(|r| r.jurisdiction.kind() == kind && same(&r.name, name))
            .filter(|r| match parent_hint {
                Some(hint) => r.parent_name.as_deref().is_some_and(|p| same(p, hint)),
                None => true,
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl PositionDirectory for MemoryDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Position>> {
        Ok(self
            .positions
            .iter()
            .filter(|p| same(&p.name, name) || same(&p.slug, name))
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Position>> {
        Ok(self.positions.clone())
    }
}

#[async_trait]
impl PartyDirectory for MemoryDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Party>> {
        Ok(self
            .parties
            .iter()
            .filter(|p| {
                same(&p.name, name) || p.abbreviation.as_deref().is_some_and(|a| same(a, name))
            })
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> Result<Vec<Party>> {
        Ok(self.parties.clone())
    }
}

#[async_trait]
impl PoliticianDirectory for MemoryDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Politician>> {
        Ok(self
            .politicians
            .iter()
            .filter(|p| same(&p.name, name))
            .cloned()
            .collect())
    }
}
