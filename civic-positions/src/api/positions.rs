//! Position history API handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    AssignOutcome, AssignPositionRequest, EndTermRequest, Jurisdiction, JurisdictionKind,
    PoliticianPositionTimeline, PositionHistoryEntry,
};
use crate::AppState;

/// Jurisdiction given as query parameters (`?kind=province&id=...`)
#[derive(Debug, Deserialize)]
pub struct JurisdictionParams {
    pub kind: String,
    #[serde(default)]
    pub id: Option<Uuid>,
}

impl JurisdictionParams {
    fn to_jurisdiction(&self) -> ApiResult<Jurisdiction> {
        let kind: JurisdictionKind = self.kind.parse().map_err(ApiError::BadRequest)?;
        Jurisdiction::from_parts(kind, self.id).map_err(ApiError::BadRequest)
    }
}

/// GET /positions/{id}/current response
#[derive(Debug, Serialize)]
pub struct CurrentHolderResponse {
    pub position_id: Uuid,
    pub jurisdiction: Jurisdiction,
    /// Null when the seat is vacant
    pub holder: Option<PositionHistoryEntry>,
}

/// POST /positions/assign
pub async fn assign_position(
    State(state): State<AppState>,
    Json(request): Json<AssignPositionRequest>,
) -> ApiResult<(StatusCode, Json<AssignOutcome>)> {
    let outcome = state.store.assign_position(request).await?;
    tracing::info!(
        entry_id = %outcome.entry.id,
        politician_id = %outcome.entry.politician_id,
        action = ?outcome.action,
        "Position assigned"
    );
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// POST /positions/history/{entry_id}/end
pub async fn end_term(
    State(state): State<AppState>,
    Path(entry_id): Path<Uuid>,
    Json(request): Json<EndTermRequest>,
) -> ApiResult<Json<PositionHistoryEntry>> {
    Ok(Json(state.store.end_term(entry_id, request).await?))
}

/// GET /positions/{position_id}/current?kind=&id=
pub async fn get_current_holder(
    State(state): State<AppState>,
    Path(position_id): Path<Uuid>,
    Query(params): Query<JurisdictionParams>,
) -> ApiResult<Json<CurrentHolderResponse>> {
    let jurisdiction = params.to_jurisdiction()?;
    let holder = state.store.get_current_holder(position_id, jurisdiction).await?;
    Ok(Json(CurrentHolderResponse {
        position_id,
        jurisdiction,
        holder,
    }))
}

/// GET /politicians/{id}/timeline
pub async fn get_timeline(
    State(state): State<AppState>,
    Path(politician_id): Path<Uuid>,
) -> ApiResult<Json<PoliticianPositionTimeline>> {
    Ok(Json(state.store.get_timeline(politician_id).await?))
}

pub fn position_routes() -> Router<AppState> {
    Router::new()
        .route("/positions/assign", post(assign_position))
        .route("/positions/history/:entry_id/end", post(end_term))
        .route("/positions/:position_id/current", get(get_current_holder))
        .route("/politicians/:politician_id/timeline", get(get_timeline))
}
