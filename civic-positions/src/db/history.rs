//! Position history rows
//!
//! Statements take any SQLite executor so the store can run them on a pool
//! or inside an assignment transaction.

use chrono::{DateTime, NaiveDate, Utc};
use civic_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor};
use uuid::Uuid;

use super::{parse_date, parse_timestamp, parse_uuid, write_error};
use crate::models::{EndedReason, Jurisdiction, PositionHistoryEntry, TimelineEntry};

const ENTRY_COLUMNS: &str = "h.id, h.politician_id, h.position_id, h.party_id, \
    h.jurisdiction_kind, h.jurisdiction_id, h.term_start, h.term_end, h.is_current, \
    h.ended_reason, h.election_id, h.created_by, h.created_at, h.updated_at";

fn optional_uuid(column: &str, value: Option<String>) -> Result<Option<Uuid>> {
    value.map(|v| parse_uuid(column, &v)).transpose()
}

pub(crate) fn entry_from_row(row: &SqliteRow) -> Result<PositionHistoryEntry> {
    let kind: String = row.try_get("jurisdiction_kind")?;
    let kind = kind.parse().map_err(Error::Internal)?;
    let jurisdiction_id = optional_uuid("jurisdiction_id", row.try_get("jurisdiction_id")?)?;
    let jurisdiction = Jurisdiction::from_parts(kind, jurisdiction_id).map_err(Error::Internal)?;

    let term_end: Option<String> = row.try_get("term_end")?;
    let ended_reason: Option<String> = row.try_get("ended_reason")?;

    Ok(PositionHistoryEntry {
        id: parse_uuid("id", &row.try_get::<String, _>("id")?)?,
        politician_id: parse_uuid("politician_id", &row.try_get::<String, _>("politician_id")?)?,
        position_id: parse_uuid("position_id", &row.try_get::<String, _>("position_id")?)?,
        party_id: optional_uuid("party_id", row.try_get("party_id")?)?,
        jurisdiction,
        term_start: parse_date("term_start", &row.try_get::<String, _>("term_start")?)?,
        term_end: term_end.map(|d| parse_date("term_end", &d)).transpose()?,
        is_current: row.try_get("is_current")?,
        ended_reason: ended_reason
            .map(|r| r.parse::<EndedReason>())
            .transpose()
            .map_err(Error::Internal)?,
        election_id: optional_uuid("election_id", row.try_get("election_id")?)?,
        created_by: row.try_get("created_by")?,
        created_at: parse_timestamp("created_at", &row.try_get::<String, _>("created_at")?)?,
        updated_at: parse_timestamp("updated_at", &row.try_get::<String, _>("updated_at")?)?,
    })
}

pub async fn get_entry(executor: impl SqliteExecutor<'_>, id: Uuid) -> Result<Option<PositionHistoryEntry>> {
    sqlx::query(&format!("SELECT {} FROM position_history h WHERE h.id = ?", ENTRY_COLUMNS))
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?
        .map(|row| entry_from_row(&row))
        .transpose()
}

/// Current entry for a (position, jurisdiction) key
pub async fn find_current(
    executor: impl SqliteExecutor<'_>,
    position_id: Uuid,
    jurisdiction: &Jurisdiction,
) -> Result<Option<PositionHistoryEntry>> {
    sqlx::query(&format!(
        "SELECT {} FROM position_history h \
         WHERE h.position_id = ? AND h.jurisdiction_kind = ? \
           AND IFNULL(h.jurisdiction_id, '') = ? AND h.is_current = 1",
        ENTRY_COLUMNS
    ))
    .bind(position_id.to_string())
    .bind(jurisdiction.kind().as_str())
    .bind(jurisdiction.id().map(|id| id.to_string()).unwrap_or_default())
    .fetch_optional(executor)
    .await?
    .map(|row| entry_from_row(&row))
    .transpose()
}

pub async fn insert_entry(executor: impl SqliteExecutor<'_>, entry: &PositionHistoryEntry) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO position_history (
            id, politician_id, position_id, party_id, jurisdiction_kind, jurisdiction_id,
            term_start, term_end, is_current, ended_reason, election_id, created_by,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(entry.id.to_string())
    .bind(entry.politician_id.to_string())
    .bind(entry.position_id.to_string())
    .bind(entry.party_id.map(|id| id.to_string()))
    .bind(entry.jurisdiction.kind().as_str())
    .bind(entry.jurisdiction.id().map(|id| id.to_string()))
    .bind(entry.term_start.to_string())
    .bind(entry.term_end.map(|d| d.to_string()))
    .bind(entry.is_current)
    .bind(entry.ended_reason.map(|r| r.as_str()))
    .bind(entry.election_id.map(|id| id.to_string()))
    .bind(&entry.created_by)
    .bind(entry.created_at.to_rfc3339())
    .bind(entry.updated_at.to_rfc3339())
    .execute(executor)
    .await
    .map_err(|e| write_error("insert position history entry", e))?;
    Ok(())
}

/// Overwrite the mutable fields of a current entry
pub async fn update_current(executor: impl SqliteExecutor<'_>, entry: &PositionHistoryEntry) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE position_history
        SET party_id = ?, term_start = ?, term_end = ?, election_id = ?, updated_at = ?
        WHERE id = ? AND is_current = 1
        "#,
    )
    .bind(entry.party_id.map(|id| id.to_string()))
    .bind(entry.term_start.to_string())
    .bind(entry.term_end.map(|d| d.to_string()))
    .bind(entry.election_id.map(|id| id.to_string()))
    .bind(entry.updated_at.to_rfc3339())
    .bind(entry.id.to_string())
    .execute(executor)
    .await
    .map_err(|e| write_error("update position history entry", e))?;
    Ok(result.rows_affected() == 1)
}

/// End a term if it is still current
///
/// Returns false when the entry was not current (already ended or unknown),
/// which callers treat as a lost race.
pub async fn end_entry(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
    end_date: NaiveDate,
    reason: EndedReason,
    now: DateTime<Utc>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE position_history
        SET is_current = 0, term_end = ?, ended_reason = ?, updated_at = ?
        WHERE id = ? AND is_current = 1
        "#,
    )
    .bind(end_date.to_string())
    .bind(reason.as_str())
    .bind(now.to_rfc3339())
    .bind(id.to_string())
    .execute(executor)
    .await
    .map_err(|e| write_error("end position history entry", e))?;
    Ok(result.rows_affected() == 1)
}

/// Every entry of one politician with position and party names, newest term first
pub async fn list_for_politician(
    executor: impl SqliteExecutor<'_>,
    politician_id: Uuid,
) -> Result<Vec<TimelineEntry>> {
    let rows = sqlx::query(&format!(
        "SELECT {}, p.name AS position_name, pt.name AS party_name \
         FROM position_history h \
         JOIN positions p ON p.id = h.position_id \
         LEFT JOIN parties pt ON pt.id = h.party_id \
         WHERE h.politician_id = ? \
         ORDER BY h.term_start DESC, h.created_at DESC",
        ENTRY_COLUMNS
    ))
    .bind(politician_id.to_string())
    .fetch_all(executor)
    .await?;

    rows.iter()
        .map(|row| {
            Ok(TimelineEntry {
                entry: entry_from_row(row)?,
                position_name: row.try_get("position_name")?,
                party_name: row.try_get("party_name")?,
            })
        })
        .collect()
}

/// Count of current entries for a key; exposed for invariant checks
pub async fn count_current(
    executor: impl SqliteExecutor<'_>,
    position_id: Uuid,
    jurisdiction: &Jurisdiction,
) -> Result<i64> {
    let count = sqlx::query_scalar(
        "SELECT COUNT(*) FROM position_history \
         WHERE position_id = ? AND jurisdiction_kind = ? \
           AND IFNULL(jurisdiction_id, '') = ? AND is_current = 1",
    )
    .bind(position_id.to_string())
    .bind(jurisdiction.kind().as_str())
    .bind(jurisdiction.id().map(|id| id.to_string()).unwrap_or_default())
    .fetch_one(executor)
    .await?;
    Ok(count)
}
