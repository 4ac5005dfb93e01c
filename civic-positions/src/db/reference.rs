//! Reference data rows
//!
//! Positions, parties and jurisdictions belong to the administrative layer.
//! The inserts here exist for seeding; the import path only reads.

use civic_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{parse_uuid, write_error};
use crate::models::{Jurisdiction, JurisdictionKind, Party, Position};
use crate::resolvers::name_key;

pub(crate) fn position_from_row(row: &SqliteRow) -> Result<Position> {
    let id: String = row.try_get("id")?;
    let level: String = row.try_get("level")?;
    let branch: String = row.try_get("branch")?;
    let max_terms: Option<i64> = row.try_get("max_terms")?;
    Ok(Position {
        id: parse_uuid("position id", &id)?,
        name: row.try_get("name")?,
        slug: row.try_get("slug")?,
        level: level.parse().map_err(Error::Internal)?,
        branch: branch.parse().map_err(Error::Internal)?,
        term_years: row.try_get::<i64, _>("term_years")? as u32,
        max_terms: max_terms.map(|m| m as u32),
        is_elected: row.try_get("is_elected")?,
    })
}

pub(crate) fn party_from_row(row: &SqliteRow) -> Result<Party> {
    let id: String = row.try_get("id")?;
    Ok(Party {
        id: parse_uuid("party id", &id)?,
        name: row.try_get("name")?,
        abbreviation: row.try_get("abbreviation")?,
        color: row.try_get("color")?,
    })
}

pub async fn insert_position(pool: &SqlitePool, position: &Position) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO positions (id, name, name_key, slug, level, branch, term_years, max_terms, is_elected)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(position.id.to_string())
    .bind(&position.name)
    .bind(name_key(&position.name))
    .bind(&position.slug)
    .bind(position.level.as_str())
    .bind(position.branch.as_str())
    .bind(position.term_years as i64)
    .bind(position.max_terms.map(|m| m as i64))
    .bind(position.is_elected)
    .execute(pool)
    .await
    .map_err(|e| write_error("insert position", e))?;
    Ok(())
}

pub async fn get_position(pool: &SqlitePool, id: Uuid) -> Result<Option<Position>> {
    sqlx::query("SELECT * FROM positions WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .map(|row| position_from_row(&row))
        .transpose()
}

pub async fn insert_party(pool: &SqlitePool, party: &Party) -> Result<()> {
    sqlx::query("INSERT INTO parties (id, name, name_key, abbreviation, color) VALUES (?, ?, ?, ?, ?)")
        .bind(party.id.to_string())
        .bind(&party.name)
        .bind(name_key(&party.name))
        .bind(&party.abbreviation)
        .bind(&party.color)
        .execute(pool)
        .await
        .map_err(|e| write_error("insert party", e))?;
    Ok(())
}

pub async fn get_party(pool: &SqlitePool, id: Uuid) -> Result<Option<Party>> {
    sqlx::query("SELECT * FROM parties WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .map(|row| party_from_row(&row))
        .transpose()
}

/// Insert a canonical jurisdiction under an optional parent
///
/// The parent must be of the kind the table references: region for
/// provinces, province for cities, city for barangays, province or city for
/// districts. Regions take no parent.
pub async fn insert_jurisdiction(
    pool: &SqlitePool,
    kind: JurisdictionKind,
    name: &str,
    parent: Option<Jurisdiction>,
) -> Result<Jurisdiction> {
    let id = Uuid::new_v4();
    let jurisdiction = Jurisdiction::from_parts(kind, Some(id)).map_err(Error::InvalidInput)?;
    let parent_id = parent.and_then(|p| p.id()).map(|id| id.to_string());
    let parent_kind = parent.map(|p| p.kind());

    let sql = match (kind, parent_kind) {
        (JurisdictionKind::Region, None) => "INSERT INTO regions (id, name, name_key) VALUES (?, ?, ?)",
        (JurisdictionKind::Province, None | Some(JurisdictionKind::Region)) => {
            "INSERT INTO provinces (id, name, name_key, region_id) VALUES (?, ?, ?, ?)"
        }
        (JurisdictionKind::City, None | Some(JurisdictionKind::Province)) => {
            "INSERT INTO cities (id, name, name_key, province_id) VALUES (?, ?, ?, ?)"
        }
        (JurisdictionKind::Barangay, None | Some(JurisdictionKind::City)) => {
            "INSERT INTO barangays (id, name, name_key, city_id) VALUES (?, ?, ?, ?)"
        }
        (JurisdictionKind::District, None | Some(JurisdictionKind::Province)) => {
            "INSERT INTO districts (id, name, name_key, province_id) VALUES (?, ?, ?, ?)"
        }
        (JurisdictionKind::District, Some(JurisdictionKind::City)) => {
            "INSERT INTO districts (id, name, name_key, city_id) VALUES (?, ?, ?, ?)"
        }
        (kind, parent) => {
            return Err(Error::InvalidInput(format!(
                "a {} cannot be placed under {:?}",
                kind, parent
            )))
        }
    };

    let mut query = sqlx::query(sql)
        .bind(id.to_string())
        .bind(name)
        .bind(name_key(name));
    if kind != JurisdictionKind::Region {
        query = query.bind(parent_id);
    }
    query
        .execute(pool)
        .await
        .map_err(|e| write_error("insert jurisdiction", e))?;

    Ok(jurisdiction)
}

/// Whether a jurisdiction reference points at an existing row
pub async fn jurisdiction_exists(pool: &SqlitePool, jurisdiction: &Jurisdiction) -> Result<bool> {
    let (Some(table), Some(id)) = (jurisdiction.kind().table(), jurisdiction.id()) else {
        return Ok(true);
    };
    let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {} WHERE id = ?", table))
        .bind(id.to_string())
        .fetch_one(pool)
        .await?;
    Ok(count > 0)
}
