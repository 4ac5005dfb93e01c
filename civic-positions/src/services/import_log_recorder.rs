//! Import log recorder
//!
//! Persists one `ImportLog` per run: created before any row is read so a long
//! import is observable at once, rewritten as counts move, finalized once.

use civic_common::{Error, Result};
use sqlx::SqlitePool;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::import_logs;
use crate::models::{ImportLog, ImportStatus};
use crate::spreadsheet::build_error_report;

pub struct ImportLogRecorder {
    pool: SqlitePool,
    max_lock_wait: Duration,
}

impl ImportLogRecorder {
    pub fn new(pool: SqlitePool, max_lock_wait: Duration) -> Self {
        Self {
            pool,
            max_lock_wait,
        }
    }

    /// Create and persist a pending log
    pub async fn create(
        &self,
        filename: &str,
        election_id: Option<Uuid>,
        validate_only: bool,
    ) -> Result<ImportLog> {
        let log = ImportLog::new(filename.to_string(), election_id, validate_only);
        import_logs::save_log(&self.pool, &log, self.max_lock_wait).await?;
        info!(log_id = %log.id, filename, validate_only, "Import log created");
        Ok(log)
    }

    /// Enter `processing` with the row count known
    pub async fn begin_processing(&self, log: &mut ImportLog, total_rows: usize) -> Result<()> {
        self.transition(log, ImportStatus::Processing)?;
        log.total_rows = total_rows;
        import_logs::save_log(&self.pool, log, self.max_lock_wait).await
    }

    /// Persist the running counts
    pub async fn update(&self, log: &ImportLog) -> Result<()> {
        import_logs::save_log(&self.pool, log, self.max_lock_wait).await
    }

    /// Mark the run completed (also after cancellation)
    pub async fn complete(&self, log: &mut ImportLog, cancelled: bool) -> Result<()> {
        log.cancelled = cancelled;
        self.transition(log, ImportStatus::Completed)?;
        import_logs::save_log(&self.pool, log, self.max_lock_wait).await?;
        info!(
            log_id = %log.id,
            processed = log.processed_rows,
            total = log.total_rows,
            successful = log.successful_imports,
            failed = log.failed_imports,
            cancelled,
            "Import completed"
        );
        Ok(())
    }

    /// Mark the run failed with a batch-level reason
    pub async fn fail(&self, log: &mut ImportLog, message: &str) -> Result<()> {
        log.error_message = Some(message.to_string());
        self.transition(log, ImportStatus::Failed)?;
        warn!(log_id = %log.id, error = message, "Import failed");
        import_logs::save_log(&self.pool, log, self.max_lock_wait).await
    }

    pub async fn get(&self, id: Uuid) -> Result<ImportLog> {
        import_logs::load_log(&self.pool, id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("import log {}", id)))
    }

    pub async fn list(&self, limit: u32) -> Result<Vec<ImportLog>> {
        import_logs::list_logs(&self.pool, limit).await
    }

    /// CSV of the failed rows of a run, annotated with their errors
    pub async fn export_error_report(&self, id: Uuid) -> Result<Vec<u8>> {
        let log = self.get(id).await?;
        build_error_report(&log.failed_rows, &log.validation_errors)
    }

    fn transition(&self, log: &mut ImportLog, next: ImportStatus) -> Result<()> {
        let from = log.status;
        if !log.transition_to(next) {
            return Err(Error::Internal(format!(
                "import log {} cannot move from {} to {}",
                log.id,
                from.as_str(),
                next.as_str()
            )));
        }
        Ok(())
    }
}
