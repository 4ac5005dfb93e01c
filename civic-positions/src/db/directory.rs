//! SQLite-backed reference directories

use async_trait::async_trait;
use civic_common::{Error, Result};
use sqlx::{Row, SqlitePool};

use super::reference::{party_from_row, position_from_row};
use super::{parse_uuid, politicians};
use crate::directory::{JurisdictionDirectory, PartyDirectory, PoliticianDirectory, PositionDirectory};
use crate::models::{Jurisdiction, JurisdictionKind, JurisdictionRecord, Party, Politician, Position};
use crate::resolvers::name_key;

pub struct SqliteDirectory {
    pool: SqlitePool,
}

impl SqliteDirectory {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

/// `(id, name, parent_name)` for one kind
fn lookup_sql(kind: JurisdictionKind) -> Option<&'static str> {
    match kind {
        JurisdictionKind::National => None,
        JurisdictionKind::Region => Some(
            "SELECT r.id, r.name, NULL AS parent_name FROM regions r \
             WHERE r.name_key = ?",
        ),
        JurisdictionKind::Province => Some(
            "SELECT p.id, p.name, r.name AS parent_name FROM provinces p \
             LEFT JOIN regions r ON r.id = p.region_id \
             WHERE p.name_key = ?",
        ),
        JurisdictionKind::City => Some(
            "SELECT c.id, c.name, p.name AS parent_name FROM cities c \
             LEFT JOIN provinces p ON p.id = c.province_id \
             WHERE c.name_key = ?",
        ),
        JurisdictionKind::Barangay => Some(
            "SELECT b.id, b.name, c.name AS parent_name FROM barangays b \
             LEFT JOIN cities c ON c.id = b.city_id \
             WHERE b.name_key = ?",
        ),
        JurisdictionKind::District => Some(
            "SELECT d.id, d.name, COALESCE(c.name, p.name) AS parent_name FROM districts d \
             LEFT JOIN provinces p ON p.id = d.province_id \
             LEFT JOIN cities c ON c.id = d.city_id \
             WHERE d.name_key = ?",
        ),
    }
}

#[async_trait]
impl JurisdictionDirectory for SqliteDirectory {
    async fn lookup(
        &self,
        kind: JurisdictionKind,
        name: &str,
        parent_hint: Option<&str>,
    ) -> Result<Vec<JurisdictionRecord>> {
        let Some(sql) = lookup_sql(kind) else {
            return Ok(vec![JurisdictionRecord {
                jurisdiction: Jurisdiction::National,
                name: name.to_string(),
                parent_name: None,
            }]);
        };

        let rows = sqlx::query(sql)
            .bind(name_key(name))
            .fetch_all(&self.pool)
            .await?;

        let hint = parent_hint.map(name_key);
        let mut records = Vec::with_capacity(rows.len());
        for row in rows {
            let parent_name: Option<String> = row.try_get("parent_name")?;
            if let Some(hint) = &hint {
                if parent_name.as_deref().map(name_key).as_ref() != Some(hint) {
                    continue;
                }
            }
            let id: String = row.try_get("id")?;
            let jurisdiction = Jurisdiction::from_parts(kind, Some(parse_uuid("jurisdiction id", &id)?))
                .map_err(Error::Internal)?;
            records.push(JurisdictionRecord {
                jurisdiction,
                name: row.try_get("name")?,
                parent_name,
            });
        }
        Ok(records)
    }
}

#[async_trait]
impl PositionDirectory for SqliteDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Position>> {
        sqlx::query("SELECT * FROM positions WHERE name_key = ? OR slug = ? COLLATE NOCASE")
            .bind(name_key(name))
            .bind(name.trim())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(position_from_row)
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<Position>> {
        sqlx::query("SELECT * FROM positions ORDER BY name")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(position_from_row)
            .collect()
    }
}

#[async_trait]
impl PartyDirectory for SqliteDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Party>> {
        sqlx::query("SELECT * FROM parties WHERE name_key = ? OR abbreviation = ? COLLATE NOCASE")
            .bind(name_key(name))
            .bind(name.trim())
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(party_from_row)
            .collect()
    }

    async fn list_all(&self) -> Result<Vec<Party>> {
        sqlx::query("SELECT * FROM parties ORDER BY name")
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(party_from_row)
            .collect()
    }
}

#[async_trait]
impl PoliticianDirectory for SqliteDirectory {
    async fn find_by_name(&self, name: &str) -> Result<Vec<Politician>> {
        politicians::find_by_name_key(&self.pool, name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;
    use crate::db::reference::{insert_jurisdiction, insert_party};

    #[tokio::test]
    async fn test_lookup_with_parent_hint() {
        let pool = memory_pool().await;
        let r1 = insert_jurisdiction(&pool, JurisdictionKind::Region, "Region I", None)
            .await
            .unwrap();
        let r2 = insert_jurisdiction(&pool, JurisdictionKind::Region, "Region II", None)
            .await
            .unwrap();
        insert_jurisdiction(&pool, JurisdictionKind::Province, "Some Province", Some(r1))
            .await
            .unwrap();
        let second = insert_jurisdiction(&pool, JurisdictionKind::Province, "Some Province", Some(r2))
            .await
            .unwrap();

        let directory = SqliteDirectory::new(pool);
        let all = directory
            .lookup(JurisdictionKind::Province, "some province", None)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);

        let hinted = directory
            .lookup(JurisdictionKind::Province, "Some Province", Some(" region  ii"))
            .await
            .unwrap();
        assert_eq!(hinted.len(), 1);
        assert_eq!(hinted[0].jurisdiction, second);
        assert_eq!(hinted[0].label(), "Some Province (Region II)");
    }

    #[tokio::test]
    async fn test_lookup_folds_non_ascii_case() {
        let pool = memory_pool().await;
        let province = insert_jurisdiction(&pool, JurisdictionKind::Province, "Metro Manila", None)
            .await
            .unwrap();
        let city = insert_jurisdiction(&pool, JurisdictionKind::City, "Parañaque", Some(province))
            .await
            .unwrap();
        insert_party(
            &pool,
            &Party {
                id: uuid::Uuid::new_v4(),
                name: "Partido Niño".to_string(),
                abbreviation: None,
                color: None,
            },
        )
        .await
        .unwrap();

        let directory = SqliteDirectory::new(pool);
        for spelling in ["Parañaque", "parañaque", "PARAÑAQUE", "  PARAÑAQUE  "] {
            let found = directory
                .lookup(JurisdictionKind::City, spelling, None)
                .await
                .unwrap();
            assert_eq!(found.len(), 1, "{}", spelling);
            assert_eq!(found[0].jurisdiction, city);
            assert_eq!(found[0].name, "Parañaque");
        }

        let parties = PartyDirectory::find_by_name(&directory, "PARTIDO NIÑO").await.unwrap();
        assert_eq!(parties.len(), 1);
    }
}
