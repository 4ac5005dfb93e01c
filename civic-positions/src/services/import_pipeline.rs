//! Import pipeline
//!
//! Drives a spreadsheet through validation and, unless the run is
//! validate-only, commits every valid row as a position assignment. Each row
//! commits in its own transaction; a bad row is recorded and the batch goes
//! on. Only an unreadable file fails a run.
//!
//! Commit-mode rows are validated one at a time so a politician created by
//! an earlier row is found by later rows. Validate-only passes resolve rows
//! concurrently, `validation_concurrency` at a time, and record them in file
//! order.

use chrono::Utc;
use civic_common::events::{CivicEvent, EventBus, ImportOutcome, RowOutcome};
use civic_common::Error;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::import_log_recorder::ImportLogRecorder;
use super::position_history::PositionHistoryStore;
use super::progress::ProgressSink;
use crate::config::ImportConfig;
use crate::db::{elections, politicians};
use crate::directory::Directories;
use crate::error::ImportError;
use crate::models::import_row::{FIELD_ROW, FIELD_TERM_START};
use crate::models::{
    AssignAction, AssignOutcome, AssignPositionRequest, ErrorKind, ImportLog, ImportRow,
    ImportValidationResult, PoliticianRef, ResolvedRow, ValidatedRow, ValidationError,
};
use crate::spreadsheet::RowReader;
use crate::utils::retry_on_lock;
use crate::validation::RowValidator;

/// What committing one row did
struct CommittedRow {
    outcome: AssignOutcome,
    politician_created: bool,
}

pub struct ImportPipeline {
    validator: RowValidator,
    store: Arc<PositionHistoryStore>,
    recorder: Arc<ImportLogRecorder>,
    reader: Arc<dyn RowReader>,
    event_bus: Option<EventBus>,
    config: ImportConfig,
}

impl ImportPipeline {
    pub fn new(
        directories: Directories,
        store: Arc<PositionHistoryStore>,
        recorder: Arc<ImportLogRecorder>,
        reader: Arc<dyn RowReader>,
        config: ImportConfig,
    ) -> Self {
        Self {
            validator: RowValidator::new(directories, &config),
            store,
            recorder,
            reader,
            event_bus: None,
            config,
        }
    }

    /// Publish run lifecycle events (`ImportStarted`, `ImportFinished`, `ImportFailed`)
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn recorder(&self) -> &ImportLogRecorder {
        &self.recorder
    }

    /// Validate a whole file without writing anything
    pub async fn validate(&self, bytes: &[u8]) -> Result<ImportValidationResult, ImportError> {
        let rows = self.reader.read_rows(bytes)?;
        let total_rows = rows.len();

        let validated: Vec<ValidatedRow> = stream::iter(rows)
            .map(|row| self.validator.validate(row))
            .buffered(self.config.validation_concurrency)
            .collect()
            .await;

        let mut result = ImportValidationResult {
            total_rows,
            valid_rows: 0,
            invalid_rows: 0,
            errors: Vec::new(),
            failed_rows: Vec::new(),
        };
        for row in validated {
            if row.is_valid {
                result.valid_rows += 1;
            } else {
                result.invalid_rows += 1;
                result.errors.extend(row.errors);
                result.failed_rows.push(row.raw);
            }
        }

        info!(
            total = result.total_rows,
            valid = result.valid_rows,
            invalid = result.invalid_rows,
            "File validated"
        );
        Ok(result)
    }

    /// Check the election and create the pending log of a new run
    ///
    /// Runs synchronously so the caller has a log id before any row is read.
    pub async fn prepare(
        &self,
        filename: &str,
        election_id: Option<Uuid>,
        validate_only: bool,
    ) -> Result<ImportLog, ImportError> {
        if let Some(id) = election_id {
            elections::get_election(self.store.pool(), id)
                .await?
                .ok_or_else(|| Error::NotFound(format!("election {}", id)))?;
        }
        Ok(self.recorder.create(filename, election_id, validate_only).await?)
    }

    /// Prepare and run in one call
    pub async fn import(
        &self,
        bytes: &[u8],
        filename: &str,
        election_id: Option<Uuid>,
        validate_only: bool,
        token: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Result<ImportLog, ImportError> {
        let log = self.prepare(filename, election_id, validate_only).await?;
        self.run(log, bytes, token, sink).await
    }

    /// Process a prepared run to a terminal status
    ///
    /// An unreadable file marks the log failed and is returned as `Ok`; the
    /// log is the result. `Err` means the log itself could not be written.
    pub async fn run(
        &self,
        mut log: ImportLog,
        bytes: &[u8],
        token: &CancellationToken,
        sink: &dyn ProgressSink,
    ) -> Result<ImportLog, ImportError> {
        let rows = match self.reader.read_rows(bytes) {
            Ok(rows) => rows,
            Err(ImportError::MalformedFile(message)) => {
                self.recorder.fail(&mut log, &message).await?;
                self.emit(CivicEvent::ImportFailed {
                    log_id: log.id,
                    error_message: message,
                    timestamp: Utc::now(),
                });
                return Ok(log);
            }
            Err(e) => return Err(e),
        };

        self.recorder.begin_processing(&mut log, rows.len()).await?;
        info!(
            log_id = %log.id,
            filename = %log.filename,
            total_rows = log.total_rows,
            validate_only = log.validate_only,
            "Import started"
        );
        self.emit(CivicEvent::ImportStarted {
            log_id: log.id,
            filename: log.filename.clone(),
            total_rows: log.total_rows,
            validate_only: log.validate_only,
            timestamp: Utc::now(),
        });

        // Each chunk is validated to completion before its rows are recorded,
        // so no lookup holds a pool connection across the progress writes.
        let chunk_size = if log.validate_only {
            self.config.validation_concurrency
        } else {
            1
        };
        let mut pending = rows.into_iter();
        let mut cancelled = false;

        'rows: loop {
            let chunk: Vec<ImportRow> = pending.by_ref().take(chunk_size).collect();
            if chunk.is_empty() {
                break;
            }
            let validated = join_all(chunk.into_iter().map(|row| self.validator.validate(row))).await;

            for row in validated {
                if token.is_cancelled() {
                    cancelled = true;
                    info!(
                        log_id = %log.id,
                        processed = log.processed_rows,
                        total = log.total_rows,
                        "Import cancelled"
                    );
                    break 'rows;
                }

                let row_number = row.row_number;
                let (outcome, message) = self.process_row(&mut log, row).await;
                debug!(log_id = %log.id, row = row_number, outcome = ?outcome, "{}", message);

                let last = log.processed_rows == log.total_rows;
                if log.processed_rows % self.config.progress_every_rows == 0 || last {
                    sink.emit(log.progress(row_number, outcome, message));
                    if let Err(e) = self.recorder.update(&log).await {
                        warn!(log_id = %log.id, error = %e, "Failed to persist import progress");
                    }
                }
            }
        }

        self.recorder.complete(&mut log, cancelled).await?;
        self.emit(CivicEvent::ImportFinished {
            log_id: log.id,
            outcome: if cancelled {
                ImportOutcome::Cancelled
            } else {
                ImportOutcome::Completed
            },
            successful_rows: log.successful_imports,
            failed_rows: log.failed_imports,
            duration_seconds: log.duration_seconds(),
            timestamp: Utc::now(),
        });
        Ok(log)
    }

    /// Record one validated row, committing it unless the run is validate-only
    async fn process_row(&self, log: &mut ImportLog, row: ValidatedRow) -> (RowOutcome, String) {
        let row_number = row.row_number;
        let ValidatedRow {
            raw,
            resolved,
            errors,
            ..
        } = row;

        let resolved = match resolved {
            Some(resolved) if errors.is_empty() => resolved,
            _ => return record_failed(log, raw, errors),
        };

        if log.validate_only {
            log.record_success();
            return (RowOutcome::Valid, format!("Row {} is valid", row_number));
        }

        match self.commit_with_retry(log.id, log.election_id, &resolved).await {
            Ok(committed) => {
                if committed.politician_created {
                    log.politicians_created += 1;
                } else {
                    log.politicians_updated += 1;
                }
                let outcome = match committed.outcome.action {
                    AssignAction::Created => RowOutcome::Created,
                    AssignAction::Updated => RowOutcome::Updated,
                    AssignAction::Superseded { .. } => {
                        log.positions_archived += 1;
                        RowOutcome::Superseded
                    }
                };
                log.record_success();
                (
                    outcome,
                    format!(
                        "Row {}: {} assigned {}",
                        row_number, resolved.position.name, committed.outcome.entry.id
                    ),
                )
            }
            Err(e) => {
                warn!(log_id = %log.id, row = row_number, error = %e, "Row commit failed");
                let error = commit_error(row_number, e);
                record_failed(log, raw, vec![error])
            }
        }
    }

    /// Commit a row, backing off while the database is locked
    ///
    /// Each attempt opens a fresh scope. When the lock wait runs out the
    /// whole backoff is repeated once before the row is failed.
    async fn commit_with_retry(
        &self,
        log_id: Uuid,
        election_id: Option<Uuid>,
        row: &ResolvedRow,
    ) -> civic_common::Result<CommittedRow> {
        let attempt = move || {
            retry_on_lock("import_row_commit", self.store.max_lock_wait(), move || {
                self.commit_row(log_id, election_id, row)
            })
        };
        match attempt().await {
            Err(e) if e.is_transient() => {
                warn!(log_id = %log_id, error = %e, "Transient commit failure, retrying row once");
                attempt().await
            }
            other => other,
        }
    }

    async fn commit_row(
        &self,
        log_id: Uuid,
        election_id: Option<Uuid>,
        row: &ResolvedRow,
    ) -> civic_common::Result<CommittedRow> {
        let mut scope = self.store.begin(row.position.id, row.jurisdiction).await?;

        let (politician_id, politician_created) = match &row.politician {
            PoliticianRef::Existing { id } => (*id, false),
            PoliticianRef::New { name } => {
                // Another run may have created the politician since validation
                let existing = politicians::find_by_name_key(scope.connection(), name).await?;
                match existing.as_slice() {
                    [] => {
                        let created = politicians::insert_politician(scope.connection(), name).await?;
                        (created.id, true)
                    }
                    [one] => (one.id, false),
                    many => {
                        return Err(Error::Conflict(format!(
                            "'{}' now matches {} politicians",
                            name,
                            many.len()
                        )))
                    }
                }
            }
        };

        let request = AssignPositionRequest {
            politician_id,
            position_id: row.position.id,
            jurisdiction: row.jurisdiction,
            party_id: row.party.as_ref().map(|p| p.id),
            term_start: row.term_start,
            term_end: row.term_end,
            election_id,
            with_history: false,
            created_by: Some(format!("import:{}", log_id)),
        };
        let outcome = self.store.assign_in(&mut scope, &request).await?;
        self.store.commit(scope).await?;

        Ok(CommittedRow {
            outcome,
            politician_created,
        })
    }

    fn emit(&self, event: CivicEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit_lossy(event);
        }
    }
}

fn record_failed(log: &mut ImportLog, raw: ImportRow, errors: Vec<ValidationError>) -> (RowOutcome, String) {
    let message = format!(
        "Row {} failed: {}",
        raw.row_number,
        errors
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect::<Vec<_>>()
            .join("; ")
    );
    log.record_failure(raw, errors);
    (RowOutcome::Failed, message)
}

/// Row-scoped error for a store failure at commit
fn commit_error(row_number: usize, err: Error) -> ValidationError {
    match err {
        Error::Conflict(msg) => {
            ValidationError::new(row_number, FIELD_ROW, ErrorKind::ConstraintViolation, msg)
        }
        Error::InvalidInput(msg) => {
            ValidationError::new(row_number, FIELD_TERM_START, ErrorKind::FieldValidation, msg)
        }
        Error::NotFound(msg) => ValidationError::new(
            row_number,
            FIELD_ROW,
            ErrorKind::FieldValidation,
            format!("Not found: {}", msg),
        ),
        other => ValidationError::new(
            row_number,
            FIELD_ROW,
            ErrorKind::TransientStoreError,
            other.to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::directory::SqliteDirectory;
    use crate::db::memory_pool;
    use crate::db::reference::{insert_jurisdiction, insert_position};
    use crate::models::{Branch, ImportStatus, JurisdictionKind, Position, PositionLevel};
    use crate::services::progress::{ChannelProgressSink, NoopProgressSink};
    use crate::spreadsheet::CsvRowReader;
    use tokio::sync::mpsc;

    const HEADER: &str = "name,position,jurisdiction_type,jurisdiction_name,party,term_start,term_end\n";

    async fn pipeline() -> ImportPipeline {
        let pool = memory_pool().await;
        insert_position(
            &pool,
            &Position {
                id: Uuid::new_v4(),
                name: "Governor".to_string(),
                slug: "governor".to_string(),
                level: PositionLevel::Provincial,
                branch: Branch::Executive,
                term_years: 3,
                max_terms: Some(3),
                is_elected: true,
            },
        )
        .await
        .unwrap();
        insert_jurisdiction(&pool, JurisdictionKind::Province, "Ilocos Norte", None)
            .await
            .unwrap();
        insert_jurisdiction(&pool, JurisdictionKind::Province, "Cebu", None)
            .await
            .unwrap();

        let config = ImportConfig::default();
        let store = Arc::new(PositionHistoryStore::new(pool.clone(), config.max_lock_wait()));
        let recorder = Arc::new(ImportLogRecorder::new(pool.clone(), config.max_lock_wait()));
        ImportPipeline::new(
            Directories::shared(Arc::new(SqliteDirectory::new(pool))),
            store,
            recorder,
            Arc::new(CsvRowReader::new()),
            config,
        )
    }

    fn file(rows: &[&str]) -> Vec<u8> {
        let mut content = HEADER.to_string();
        for row in rows {
            content.push_str(row);
            content.push('\n');
        }
        content.into_bytes()
    }

    #[tokio::test]
    async fn test_validate_writes_nothing() {
        let pipeline = pipeline().await;
        let bytes = file(&[
            "Ana Reyes,Governor,province,Ilocos Norte,,2019-06-30,",
            "Ben Cruz,Govenor,province,Cebu,,2019-06-30,",
        ]);

        let result = pipeline.validate(&bytes).await.unwrap();
        assert_eq!(result.total_rows, 2);
        assert_eq!(result.valid_rows, 1);
        assert_eq!(result.invalid_rows, 1);
        assert_eq!(result.errors[0].row_number, 3);
        assert!(result.errors[0].suggestions.contains(&"Governor".to_string()));

        assert!(pipeline.recorder().list(10).await.unwrap().is_empty());
        let found = politicians::find_by_name_key(pipeline.store.pool(), "Ana Reyes")
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_file_fails_run() {
        let pipeline = pipeline().await;
        let token = CancellationToken::new();
        let log = pipeline
            .import(b"just,some,columns\n1,2,3\n", "bad.csv", None, false, &token, &NoopProgressSink)
            .await
            .unwrap();

        assert_eq!(log.status, ImportStatus::Failed);
        assert!(log.error_message.is_some());
        assert_eq!(log.processed_rows, 0);
        assert!(matches!(
            pipeline.validate(b"").await,
            Err(ImportError::MalformedFile(_))
        ));
    }

    #[tokio::test]
    async fn test_commit_counts_and_progress() {
        let pipeline = pipeline().await;
        let (tx, mut rx) = mpsc::channel(16);
        let sink = ChannelProgressSink::new(tx);
        let token = CancellationToken::new();

        let bytes = file(&[
            "Ana Reyes,Governor,province,Ilocos Norte,,2019-06-30,",
            "Ben Cruz,Governor,province,Ilocos Norte,,2022-06-30,",
            "Ben Cruz,Governor,province,Cebu,,2022-06-30,",
            "Carl Lim,Governor,city,Cebu,,2022-06-30,",
        ]);
        let log = pipeline
            .import(&bytes, "results.csv", None, false, &token, &sink)
            .await
            .unwrap();

        assert_eq!(log.status, ImportStatus::Completed);
        assert_eq!(log.total_rows, 4);
        assert_eq!(log.successful_imports, 3);
        assert_eq!(log.failed_imports, 1);
        assert_eq!(log.politicians_created, 2);
        assert_eq!(log.politicians_updated, 1);
        assert_eq!(log.positions_archived, 1);
        assert_eq!(log.failed_rows[0].row_number, 5);

        let mut snapshots = Vec::new();
        while let Ok(progress) = rx.try_recv() {
            snapshots.push(progress);
        }
        assert_eq!(snapshots.len(), 4);
        assert_eq!(snapshots[1].row_outcome, RowOutcome::Superseded);
        assert_eq!(snapshots[3].row_outcome, RowOutcome::Failed);
        assert_eq!(snapshots[3].processed_rows, 4);

        let stored = pipeline.recorder().get(log.id).await.unwrap();
        assert_eq!(stored, log);
    }

    #[tokio::test]
    async fn test_backdated_row_is_row_error() {
        let pipeline = pipeline().await;
        let token = CancellationToken::new();
        let bytes = file(&[
            "Ana Reyes,Governor,province,Ilocos Norte,,2019-06-30,",
            "Ben Cruz,Governor,province,Ilocos Norte,,2016-06-30,",
        ]);
        let log = pipeline
            .import(&bytes, "results.csv", None, false, &token, &NoopProgressSink)
            .await
            .unwrap();

        assert_eq!(log.successful_imports, 1);
        assert_eq!(log.failed_imports, 1);
        assert_eq!(log.validation_errors[0].field, FIELD_TERM_START);
        assert_eq!(log.validation_errors[0].kind, ErrorKind::FieldValidation);
    }

    #[tokio::test]
    async fn test_cancelled_before_first_row() {
        let pipeline = pipeline().await;
        let token = CancellationToken::new();
        token.cancel();

        let bytes = file(&["Ana Reyes,Governor,province,Ilocos Norte,,2019-06-30,"]);
        let log = pipeline
            .import(&bytes, "results.csv", None, false, &token, &NoopProgressSink)
            .await
            .unwrap();

        assert_eq!(log.status, ImportStatus::Completed);
        assert!(log.cancelled);
        assert_eq!(log.processed_rows, 0);
        assert_eq!(log.total_rows, 1);
    }

    #[tokio::test]
    async fn test_unknown_election_rejected_before_log() {
        let pipeline = pipeline().await;
        let err = pipeline
            .prepare("results.csv", Some(Uuid::new_v4()), false)
            .await
            .unwrap_err();
        assert!(matches!(err, ImportError::Store(Error::NotFound(_))));
        assert!(pipeline.recorder().list(10).await.unwrap().is_empty());
    }

    #[test]
    fn test_commit_error_mapping() {
        let conflict = commit_error(4, Error::Conflict("taken".to_string()));
        assert_eq!(conflict.kind, ErrorKind::ConstraintViolation);
        assert_eq!(conflict.field, FIELD_ROW);

        let busy = commit_error(4, Error::Transient("locked".to_string()));
        assert_eq!(busy.kind, ErrorKind::TransientStoreError);

        let dates = commit_error(4, Error::InvalidInput("backdated".to_string()));
        assert_eq!(dates.field, FIELD_TERM_START);
    }
}
