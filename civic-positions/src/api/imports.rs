//! Import API handlers
//!
//! POST /imports/validate, POST /imports, GET /imports, GET /imports/{id},
//! GET /imports/{id}/errors.csv, POST /imports/{id}/cancel
//!
//! Request bodies are the raw file bytes.

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{ImportLog, ImportValidationResult};
use crate::services::EventBusProgressSink;
use crate::AppState;

/// Largest accepted upload
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

const DEFAULT_LIST_LIMIT: u32 = 20;
const MAX_LIST_LIMIT: u32 = 200;

/// POST /imports query string
#[derive(Debug, Deserialize)]
pub struct StartImportParams {
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub election_id: Option<Uuid>,
    #[serde(default)]
    pub validate_only: bool,
}

/// GET /imports query string
#[derive(Debug, Deserialize)]
pub struct ListImportsParams {
    #[serde(default)]
    pub limit: Option<u32>,
}

/// POST /imports/{id}/cancel response
#[derive(Debug, Serialize)]
pub struct CancelImportResponse {
    pub log_id: Uuid,
    pub cancellation_requested: bool,
}

/// POST /imports/validate
///
/// Validates every row and returns the full error list. Writes nothing.
pub async fn validate_import(
    State(state): State<AppState>,
    body: Bytes,
) -> ApiResult<Json<ImportValidationResult>> {
    let result = state.pipeline.validate(&body).await?;
    Ok(Json(result))
}

/// POST /imports
///
/// Creates the import log and returns it (202, status pending) while rows
/// are processed in the background.
pub async fn start_import(
    State(state): State<AppState>,
    Query(params): Query<StartImportParams>,
    body: Bytes,
) -> ApiResult<(StatusCode, Json<ImportLog>)> {
    let filename = params
        .filename
        .filter(|f| !f.trim().is_empty())
        .unwrap_or_else(|| "upload.csv".to_string());

    let log = state
        .pipeline
        .prepare(&filename, params.election_id, params.validate_only)
        .await?;

    let token = CancellationToken::new();
    state
        .cancellation_tokens
        .write()
        .await
        .insert(log.id, token.clone());

    tracing::info!(
        log_id = %log.id,
        filename = %filename,
        bytes = body.len(),
        validate_only = params.validate_only,
        "Import accepted"
    );

    let response = log.clone();
    let state_clone = state.clone();
    tokio::spawn(async move {
        let log_id = log.id;
        execute_import(&state_clone, log, body, token).await;
        state_clone.cancellation_tokens.write().await.remove(&log_id);
    });

    Ok((StatusCode::ACCEPTED, Json(response)))
}

/// Background task body for one run
///
/// A run that errors out (its log could not be written) is marked failed
/// here so it does not stay `processing` forever.
async fn execute_import(state: &AppState, log: ImportLog, body: Bytes, token: CancellationToken) {
    let log_id = log.id;
    let sink = EventBusProgressSink::new(state.event_bus.clone());

    match state.pipeline.run(log, &body, &token, &sink).await {
        Ok(log) => {
            tracing::info!(
                log_id = %log_id,
                status = log.status.as_str(),
                successful = log.successful_imports,
                failed = log.failed_imports,
                "Background import finished"
            );
        }
        Err(e) => {
            tracing::error!(log_id = %log_id, error = %e, "Background import failed");

            let recorder = state.pipeline.recorder();
            match recorder.get(log_id).await {
                Ok(mut log) if !log.is_terminal() => {
                    if let Err(failure_error) = recorder.fail(&mut log, &e.to_string()).await {
                        tracing::error!(
                            log_id = %log_id,
                            error = %failure_error,
                            "Failed to mark import log as failed"
                        );
                    }
                }
                Ok(_) => {}
                Err(load_error) => {
                    tracing::error!(
                        log_id = %log_id,
                        error = %load_error,
                        "Failed to load import log after failure"
                    );
                }
            }
        }
    }
}

/// GET /imports
pub async fn list_imports(
    State(state): State<AppState>,
    Query(params): Query<ListImportsParams>,
) -> ApiResult<Json<Vec<ImportLog>>> {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_LIST_LIMIT)
        .clamp(1, MAX_LIST_LIMIT);
    Ok(Json(state.pipeline.recorder().list(limit).await?))
}

/// GET /imports/{id}
pub async fn get_import(
    State(state): State<AppState>,
    Path(log_id): Path<Uuid>,
) -> ApiResult<Json<ImportLog>> {
    Ok(Json(state.pipeline.recorder().get(log_id).await?))
}

/// GET /imports/{id}/errors.csv
///
/// Failed rows with their original columns plus `errors` and `suggestions`.
pub async fn export_error_report(
    State(state): State<AppState>,
    Path(log_id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let report = state.pipeline.recorder().export_error_report(log_id).await?;
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"import-{}-errors.csv\"", log_id),
        ),
    ];
    Ok((headers, report))
}

/// POST /imports/{id}/cancel
///
/// Signals the running import; it stops before its next row.
pub async fn cancel_import(
    State(state): State<AppState>,
    Path(log_id): Path<Uuid>,
) -> ApiResult<Json<CancelImportResponse>> {
    let token = state.cancellation_tokens.read().await.get(&log_id).cloned();

    match token {
        Some(token) => {
            token.cancel();
            tracing::info!(log_id = %log_id, "Import cancellation requested");
            Ok(Json(CancelImportResponse {
                log_id,
                cancellation_requested: true,
            }))
        }
        None => {
            let log = state.pipeline.recorder().get(log_id).await?;
            Err(ApiError::Conflict(format!(
                "Import {} is not running (status {})",
                log_id,
                log.status.as_str()
            )))
        }
    }
}

/// Build import routes
pub fn import_routes() -> Router<AppState> {
    Router::new()
        .route("/imports/validate", post(validate_import))
        .route("/imports", post(start_import).get(list_imports))
        .route("/imports/:log_id", get(get_import))
        .route("/imports/:log_id/errors.csv", get(export_error_report))
        .route("/imports/:log_id/cancel", post(cancel_import))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
