//! Politician rows
//!
//! The import path creates politicians inside the row's commit transaction,
//! so a row that fails later leaves no orphan behind.

use chrono::Utc;
use civic_common::Result;
use sqlx::{Row, SqliteExecutor};
use uuid::Uuid;

use super::{parse_uuid, write_error};
use crate::models::Politician;
use crate::resolvers::name_key;

pub async fn insert_politician(executor: impl SqliteExecutor<'_>, name: &str) -> Result<Politician> {
    let politician = Politician {
        id: Uuid::new_v4(),
        name: name.split_whitespace().collect::<Vec<_>>().join(" "),
    };
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        "INSERT INTO politicians (id, name, name_key, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
    )
    .bind(politician.id.to_string())
    .bind(&politician.name)
    .bind(name_key(name))
    .bind(&now)
    .bind(&now)
    .execute(executor)
    .await
    .map_err(|e| write_error("insert politician", e))?;

    Ok(politician)
}

pub async fn get_politician(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<Politician>> {
    let row = sqlx::query("SELECT id, name FROM politicians WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?;

    match row {
        Some(row) => {
            let id: String = row.try_get("id")?;
            Ok(Some(Politician {
                id: parse_uuid("politician id", &id)?,
                name: row.try_get("name")?,
            }))
        }
        None => Ok(None),
    }
}

/// Politicians whose folded name equals the folded `name`
pub async fn find_by_name_key(executor: impl SqliteExecutor<'_>, name: &str) -> Result<Vec<Politician>> {
    let rows = sqlx::query("SELECT id, name FROM politicians WHERE name_key = ?")
        .bind(name_key(name))
        .fetch_all(executor)
        .await?;

    rows.iter()
        .map(|row| {
            let id: String = row.try_get("id")?;
            Ok(Politician {
                id: parse_uuid("politician id", &id)?,
                name: row.try_get("name")?,
            })
        })
        .collect()
}

/// Bump `updated_at` after a new assignment
pub async fn touch_politician(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<()> {
    sqlx::query("UPDATE politicians SET updated_at = ? WHERE id = ?")
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .execute(executor)
        .await?;
    Ok(())
}
