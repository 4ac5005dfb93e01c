//! Import log persistence
//!
//! One row per run. The error list and the raw failed rows are stored as JSON
//! TEXT so the error report can be rebuilt long after the upload is gone.

use civic_common::{Error, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};
use std::time::Duration;
use uuid::Uuid;

use super::{parse_timestamp, parse_uuid};
use crate::models::{ImportLog, ImportRow, ValidationError};
use crate::utils::retry_on_lock;

/// Insert or update an import log
///
/// Uses `retry_on_lock` so progress writes survive short lock contention with
/// row commits.
pub async fn save_log(pool: &SqlitePool, log: &ImportLog, max_wait: Duration) -> Result<()> {
    // Prepare all data before touching the database
    let id = log.id.to_string();
    let election_id = log.election_id.map(|id| id.to_string());
    let validation_errors = serde_json::to_string(&log.validation_errors)
        .map_err(|e| Error::Internal(format!("Failed to serialize validation errors: {}", e)))?;
    let failed_rows = serde_json::to_string(&log.failed_rows)
        .map_err(|e| Error::Internal(format!("Failed to serialize failed rows: {}", e)))?;
    let started_at = log.started_at.to_rfc3339();
    let completed_at = log.completed_at.map(|dt| dt.to_rfc3339());

    retry_on_lock("save_import_log", max_wait, || async {
        sqlx::query(
            r#"
            INSERT INTO import_logs (
                id, filename, election_id, validate_only, status,
                total_rows, processed_rows, successful_imports, failed_imports,
                politicians_created, politicians_updated, positions_archived,
                validation_errors, failed_rows, cancelled, error_message,
                started_at, completed_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                status = excluded.status,
                total_rows = excluded.total_rows,
                processed_rows = excluded.processed_rows,
                successful_imports = excluded.successful_imports,
                failed_imports = excluded.failed_imports,
                politicians_created = excluded.politicians_created,
                politicians_updated = excluded.politicians_updated,
                positions_archived = excluded.positions_archived,
                validation_errors = excluded.validation_errors,
                failed_rows = excluded.failed_rows,
                cancelled = excluded.cancelled,
                error_message = excluded.error_message,
                completed_at = excluded.completed_at
            "#,
        )
        .bind(&id)
        .bind(&log.filename)
        .bind(&election_id)
        .bind(log.validate_only)
        .bind(log.status.as_str())
        .bind(log.total_rows as i64)
        .bind(log.processed_rows as i64)
        .bind(log.successful_imports as i64)
        .bind(log.failed_imports as i64)
        .bind(log.politicians_created as i64)
        .bind(log.politicians_updated as i64)
        .bind(log.positions_archived as i64)
        .bind(&validation_errors)
        .bind(&failed_rows)
        .bind(log.cancelled)
        .bind(&log.error_message)
        .bind(&started_at)
        .bind(&completed_at)
        .execute(pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    })
    .await
}

fn log_from_row(row: &SqliteRow) -> Result<ImportLog> {
    let id: String = row.try_get("id")?;
    let election_id: Option<String> = row.try_get("election_id")?;
    let status: String = row.try_get("status")?;

    let validation_errors: String = row.try_get("validation_errors")?;
    let validation_errors: Vec<ValidationError> = serde_json::from_str(&validation_errors)
        .map_err(|e| Error::Internal(format!("Failed to deserialize validation errors: {}", e)))?;

    let failed_rows: String = row.try_get("failed_rows")?;
    let failed_rows: Vec<ImportRow> = serde_json::from_str(&failed_rows)
        .map_err(|e| Error::Internal(format!("Failed to deserialize failed rows: {}", e)))?;

    let started_at: String = row.try_get("started_at")?;
    let completed_at: Option<String> = row.try_get("completed_at")?;

    let count = |column: &str| -> Result<usize> { Ok(row.try_get::<i64, _>(column)? as usize) };

    Ok(ImportLog {
        id: parse_uuid("import log id", &id)?,
        filename: row.try_get("filename")?,
        election_id: election_id.map(|e| parse_uuid("election_id", &e)).transpose()?,
        validate_only: row.try_get("validate_only")?,
        status: status.parse().map_err(Error::Internal)?,
        total_rows: count("total_rows")?,
        processed_rows: count("processed_rows")?,
        successful_imports: count("successful_imports")?,
        failed_imports: count("failed_imports")?,
        politicians_created: count("politicians_created")?,
        politicians_updated: count("politicians_updated")?,
        positions_archived: count("positions_archived")?,
        validation_errors,
        failed_rows,
        cancelled: row.try_get("cancelled")?,
        error_message: row.try_get("error_message")?,
        started_at: parse_timestamp("started_at", &started_at)?,
        completed_at: completed_at
            .map(|c| parse_timestamp("completed_at", &c))
            .transpose()?,
    })
}

/// Load an import log by id
pub async fn load_log(pool: &SqlitePool, id: Uuid) -> Result<Option<ImportLog>> {
    sqlx::query("SELECT * FROM import_logs WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?
        .map(|row| log_from_row(&row))
        .transpose()
}

/// Most recent runs, newest first
pub async fn list_logs(pool: &SqlitePool, limit: u32) -> Result<Vec<ImportLog>> {
    sqlx::query("SELECT * FROM import_logs ORDER BY started_at DESC LIMIT ?")
        .bind(limit as i64)
        .fetch_all(pool)
        .await?
        .iter()
        .map(log_from_row)
        .collect()
}
