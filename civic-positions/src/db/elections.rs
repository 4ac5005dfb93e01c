//! Election rows

use chrono::{NaiveDate, Utc};
use civic_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteExecutor, SqlitePool};
use uuid::Uuid;

use super::{parse_date, parse_uuid, write_error};
use crate::models::{ElectionEvent, ElectionStatus, PositionLevel};

fn election_from_row(row: &SqliteRow) -> Result<ElectionEvent> {
    let id: String = row.try_get("id")?;
    let date: String = row.try_get("election_date")?;
    let level: String = row.try_get("level")?;
    let status: String = row.try_get("status")?;
    Ok(ElectionEvent {
        id: parse_uuid("election id", &id)?,
        name: row.try_get("name")?,
        election_date: parse_date("election_date", &date)?,
        level: level.parse().map_err(Error::Internal)?,
        status: status.parse().map_err(Error::Internal)?,
    })
}

/// Create a scheduled election
pub async fn create_election(
    pool: &SqlitePool,
    name: &str,
    election_date: NaiveDate,
    level: PositionLevel,
) -> Result<ElectionEvent> {
    let election = ElectionEvent {
        id: Uuid::new_v4(),
        name: name.to_string(),
        election_date,
        level,
        status: ElectionStatus::Scheduled,
    };
    let now = Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        INSERT INTO elections (id, name, election_date, level, status, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(election.id.to_string())
    .bind(&election.name)
    .bind(election.election_date.to_string())
    .bind(election.level.as_str())
    .bind(election.status.as_str())
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await
    .map_err(|e| write_error("insert election", e))?;

    Ok(election)
}

pub async fn get_election(
    executor: impl SqliteExecutor<'_>,
    id: Uuid,
) -> Result<Option<ElectionEvent>> {
    sqlx::query("SELECT * FROM elections WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(executor)
        .await?
        .map(|row| election_from_row(&row))
        .transpose()
}

/// Move an election through its status machine
///
/// The update is conditional on the status read, so two concurrent
/// transitions cannot both succeed.
pub async fn transition_election(
    pool: &SqlitePool,
    id: Uuid,
    next: ElectionStatus,
) -> Result<ElectionEvent> {
    let mut election = get_election(pool, id)
        .await?
        .ok_or_else(|| Error::NotFound(format!("election {}", id)))?;

    if !election.status.can_transition_to(next) {
        return Err(Error::Conflict(format!(
            "election {} cannot move from {} to {}",
            id,
            election.status.as_str(),
            next.as_str()
        )));
    }

    let result = sqlx::query("UPDATE elections SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
        .bind(next.as_str())
        .bind(Utc::now().to_rfc3339())
        .bind(id.to_string())
        .bind(election.status.as_str())
        .execute(pool)
        .await?;

    if result.rows_affected() != 1 {
        return Err(Error::Conflict(format!("election {} changed concurrently", id)));
    }

    tracing::info!(election_id = %id, from = election.status.as_str(), to = next.as_str(), "Election status changed");
    election.status = next;
    Ok(election)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_pool;

    #[tokio::test]
    async fn test_election_lifecycle() {
        let pool = memory_pool().await;
        let date = NaiveDate::from_ymd_opt(2025, 5, 12).unwrap();
        let election = create_election(&pool, "2025 Midterms", date, PositionLevel::National)
            .await
            .unwrap();
        assert_eq!(election.status, ElectionStatus::Scheduled);

        let running = transition_election(&pool, election.id, ElectionStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(running.status, ElectionStatus::InProgress);

        let err = transition_election(&pool, election.id, ElectionStatus::Scheduled)
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let done = transition_election(&pool, election.id, ElectionStatus::Completed)
            .await
            .unwrap();
        assert_eq!(get_election(&pool, election.id).await.unwrap(), Some(done));
    }

    #[tokio::test]
    async fn test_unknown_election() {
        let pool = memory_pool().await;
        let err = transition_election(&pool, Uuid::new_v4(), ElectionStatus::Cancelled)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
