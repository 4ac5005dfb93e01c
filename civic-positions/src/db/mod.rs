//! Database access for civic-positions
//!
//! One SQLite file in the root folder. Tables are created idempotently at
//! startup; there is no migration tooling.

pub mod directory;
pub mod elections;
pub mod history;
pub mod import_logs;
pub mod politicians;
pub mod reference;

use civic_common::{Error, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// Initialize database connection pool
///
/// Creates the file (and its parent directory) if needed, then the tables.
/// `busy_timeout` is how long a connection waits on another writer's lock
/// before SQLite reports `database is locked`; pass the configured lock wait.
pub async fn init_database_pool(db_path: &Path, busy_timeout: Duration) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let options = SqliteConnectOptions::from_str(&db_url)?
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(8)
        .connect_with(options)
        .await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create all tables and indexes if they don't exist
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    // Canonical jurisdictions
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS regions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS provinces (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL DEFAULT '',
            region_id TEXT REFERENCES regions(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Cities and municipalities share this table
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS cities (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL DEFAULT '',
            province_id TEXT REFERENCES provinces(id),
            is_municipality INTEGER NOT NULL DEFAULT 0
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS barangays (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL DEFAULT '',
            city_id TEXT REFERENCES cities(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS districts (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL DEFAULT '',
            province_id TEXT REFERENCES provinces(id),
            city_id TEXT REFERENCES cities(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Reference data
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS positions (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL DEFAULT '',
            slug TEXT NOT NULL UNIQUE,
            level TEXT NOT NULL,
            branch TEXT NOT NULL,
            term_years INTEGER NOT NULL,
            max_terms INTEGER,
            is_elected INTEGER NOT NULL DEFAULT 1
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS parties (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            name_key TEXT NOT NULL DEFAULT '',
            abbreviation TEXT,
            color TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS politicians (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            name_key TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_politicians_name_key ON politicians(name_key)")
        .execute(pool)
        .await?;

    // Lookups match on name_key, since SQLite's NOCASE only folds ASCII
    for table in NAME_KEYED_TABLES {
        add_column_if_missing(pool, table, "name_key", "TEXT NOT NULL DEFAULT ''").await?;
        backfill_name_keys(pool, table).await?;
        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS idx_{table}_name_key ON {table}(name_key)"
        ))
        .execute(pool)
        .await?;
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS elections (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            election_date TEXT NOT NULL,
            level TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'scheduled',
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // Position ledger
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS position_history (
            id TEXT PRIMARY KEY,
            politician_id TEXT NOT NULL REFERENCES politicians(id),
            position_id TEXT NOT NULL REFERENCES positions(id),
            party_id TEXT REFERENCES parties(id),
            jurisdiction_kind TEXT NOT NULL,
            jurisdiction_id TEXT,
            term_start TEXT NOT NULL,
            term_end TEXT,
            is_current INTEGER NOT NULL DEFAULT 1,
            ended_reason TEXT,
            election_id TEXT REFERENCES elections(id),
            created_by TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            CHECK (term_end IS NULL OR term_end >= term_start),
            CHECK ((jurisdiction_kind = 'national') = (jurisdiction_id IS NULL))
        )
        "#,
    )
    .execute(pool)
    .await?;

    // At most one current holder per (position, jurisdiction)
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS ux_position_history_current
        ON position_history(position_id, jurisdiction_kind, IFNULL(jurisdiction_id, ''))
        WHERE is_current = 1
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_position_history_politician ON position_history(politician_id)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS import_logs (
            id TEXT PRIMARY KEY,
            filename TEXT NOT NULL,
            election_id TEXT,
            validate_only INTEGER NOT NULL DEFAULT 0,
            status TEXT NOT NULL,
            total_rows INTEGER NOT NULL DEFAULT 0,
            processed_rows INTEGER NOT NULL DEFAULT 0,
            successful_imports INTEGER NOT NULL DEFAULT 0,
            failed_imports INTEGER NOT NULL DEFAULT 0,
            politicians_created INTEGER NOT NULL DEFAULT 0,
            politicians_updated INTEGER NOT NULL DEFAULT 0,
            positions_archived INTEGER NOT NULL DEFAULT 0,
            validation_errors TEXT NOT NULL DEFAULT '[]',
            failed_rows TEXT NOT NULL DEFAULT '[]',
            cancelled INTEGER NOT NULL DEFAULT 0,
            error_message TEXT,
            started_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database tables initialized");

    Ok(())
}

/// Reference tables looked up by [`crate::resolvers::name_key`]
const NAME_KEYED_TABLES: [&str; 7] = [
    "regions",
    "provinces",
    "cities",
    "barangays",
    "districts",
    "positions",
    "parties",
];

/// Add a column that databases created by older builds lack
async fn add_column_if_missing(pool: &SqlitePool, table: &str, column: &str, decl: &str) -> Result<()> {
    let present: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM pragma_table_info(?) WHERE name = ?")
            .bind(table)
            .bind(column)
            .fetch_one(pool)
            .await?;
    if present == 0 {
        sqlx::query(&format!("ALTER TABLE {} ADD COLUMN {} {}", table, column, decl))
            .execute(pool)
            .await?;
        tracing::info!(table, column, "Added missing column");
    }
    Ok(())
}

/// Fill `name_key` for rows written before the column existed
async fn backfill_name_keys(pool: &SqlitePool, table: &str) -> Result<()> {
    let rows: Vec<(String, String)> =
        sqlx::query_as(&format!("SELECT id, name FROM {} WHERE name_key = ''", table))
            .fetch_all(pool)
            .await?;
    for (id, name) in &rows {
        sqlx::query(&format!("UPDATE {} SET name_key = ? WHERE id = ?", table))
            .bind(crate::resolvers::name_key(name))
            .bind(id)
            .execute(pool)
            .await?;
    }
    if !rows.is_empty() {
        tracing::info!(table, rows = rows.len(), "Backfilled name keys");
    }
    Ok(())
}

/// Classify a failed write
///
/// Constraint failures become `Conflict` (uniqueness) or `InvalidInput`
/// (check or foreign key); everything else stays a database error.
pub(crate) fn write_error(context: &str, err: sqlx::Error) -> Error {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return Error::Conflict(format!("{}: {}", context, db_err.message()));
        }
        if db_err.is_check_violation() || db_err.is_foreign_key_violation() {
            return Error::InvalidInput(format!("{}: {}", context, db_err.message()));
        }
    }
    Error::Database(err)
}

/// Parse a UUID stored as TEXT
pub(crate) fn parse_uuid(column: &str, value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| Error::Internal(format!("Invalid {} '{}': {}", column, value, e)))
}

/// Parse an ISO-8601 date stored as TEXT
pub(crate) fn parse_date(column: &str, value: &str) -> Result<chrono::NaiveDate> {
    chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|e| Error::Internal(format!("Invalid {} '{}': {}", column, value, e)))
}

/// Parse an RFC3339 timestamp stored as TEXT
pub(crate) fn parse_timestamp(column: &str, value: &str) -> Result<chrono::DateTime<chrono::Utc>> {
    chrono::DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&chrono::Utc))
        .map_err(|e| Error::Internal(format!("Invalid {} '{}': {}", column, value, e)))
}

#[cfg(test)]
pub(crate) async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap();
    init_tables(&pool).await.unwrap();
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_init_tables_is_idempotent() {
        let pool = memory_pool().await;
        init_tables(&pool).await.unwrap();

        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
             ('regions','provinces','cities','barangays','districts','positions','parties',\
              'politicians','elections','position_history','import_logs')",
        )
        .fetch_one(&pool)
        .await
        .unwrap();
        assert_eq!(count, 11);
    }

    #[tokio::test]
    async fn test_file_pool_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("civic.db");
        let pool = init_database_pool(&path, Duration::from_secs(5)).await.unwrap();
        assert!(path.exists());
        pool.close().await;
    }

    #[tokio::test]
    async fn test_name_key_backfilled_on_older_schema() {
        let options = SqliteConnectOptions::from_str("sqlite::memory:").unwrap();
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();
        sqlx::query("CREATE TABLE cities (id TEXT PRIMARY KEY, name TEXT NOT NULL, province_id TEXT, is_municipality INTEGER NOT NULL DEFAULT 0)")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO cities (id, name) VALUES ('c1', '  Las  PIÑAS ')")
            .execute(&pool)
            .await
            .unwrap();

        init_tables(&pool).await.unwrap();

        let key: String = sqlx::query_scalar("SELECT name_key FROM cities WHERE id = 'c1'")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(key, "las piñas");
    }
}
