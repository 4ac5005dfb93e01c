//! Election API handlers
//!
//! POST /elections, GET /elections/{id}, POST /elections/{id}/status

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use uuid::Uuid;

use crate::db::elections;
use crate::error::{ApiError, ApiResult};
use crate::models::{ElectionEvent, ElectionStatus, PositionLevel};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateElectionRequest {
    pub name: String,
    pub election_date: NaiveDate,
    pub level: PositionLevel,
}

#[derive(Debug, Deserialize)]
pub struct TransitionElectionRequest {
    pub status: ElectionStatus,
}

/// POST /elections
pub async fn create_election(
    State(state): State<AppState>,
    Json(request): Json<CreateElectionRequest>,
) -> ApiResult<(StatusCode, Json<ElectionEvent>)> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Election name is required".to_string()));
    }
    let election =
        elections::create_election(&state.db, name, request.election_date, request.level).await?;
    tracing::info!(election_id = %election.id, name = %election.name, "Election created");
    Ok((StatusCode::CREATED, Json(election)))
}

/// GET /elections/{id}
pub async fn get_election(
    State(state): State<AppState>,
    Path(election_id): Path<Uuid>,
) -> ApiResult<Json<ElectionEvent>> {
    elections::get_election(&state.db, election_id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Election not found: {}", election_id)))
}

/// POST /elections/{id}/status
pub async fn transition_election(
    State(state): State<AppState>,
    Path(election_id): Path<Uuid>,
    Json(request): Json<TransitionElectionRequest>,
) -> ApiResult<Json<ElectionEvent>> {
    Ok(Json(
        elections::transition_election(&state.db, election_id, request.status).await?,
    ))
}

pub fn election_routes() -> Router<AppState> {
    Router::new()
        .route("/elections", post(create_election))
        .route("/elections/:election_id", get(get_election))
        .route("/elections/:election_id/status", post(transition_election))
}
