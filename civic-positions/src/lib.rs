//! civic-positions library interface
//!
//! Position history ledger and bulk import pipeline. The binary serves these
//! operations over HTTP; integration tests drive the library directly.

pub mod api;
pub mod config;
pub mod db;
pub mod directory;
pub mod error;
pub mod models;
pub mod resolvers;
pub mod services;
pub mod spreadsheet;
pub mod utils;
pub mod validation;

pub use crate::error::{ApiError, ApiResult, ImportError};

use axum::Router;
use chrono::{DateTime, Utc};
use civic_common::events::EventBus;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use crate::config::ImportConfig;
use crate::db::directory::SqliteDirectory;
use crate::directory::Directories;
use crate::services::{ImportLogRecorder, ImportPipeline, PositionHistoryStore};
use crate::spreadsheet::CsvRowReader;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Event bus for SSE broadcasting
    pub event_bus: EventBus,
    /// Cancellation tokens of running imports, keyed by import log id
    pub cancellation_tokens: Arc<RwLock<HashMap<Uuid, CancellationToken>>>,
    /// Service startup timestamp for uptime tracking
    pub startup_time: DateTime<Utc>,
    pub store: Arc<PositionHistoryStore>,
    pub pipeline: Arc<ImportPipeline>,
}

impl AppState {
    /// Wire the store, recorder and pipeline over one pool
    pub fn new(db: SqlitePool, event_bus: EventBus, config: ImportConfig) -> Self {
        let store = Arc::new(
            PositionHistoryStore::new(db.clone(), config.max_lock_wait())
                .with_event_bus(event_bus.clone()),
        );
        let recorder = Arc::new(ImportLogRecorder::new(db.clone(), config.max_lock_wait()));
        let directories = Directories::shared(Arc::new(SqliteDirectory::new(db.clone())));
        let pipeline = Arc::new(
            ImportPipeline::new(
                directories,
                store.clone(),
                recorder,
                Arc::new(CsvRowReader::new()),
                config,
            )
            .with_event_bus(event_bus.clone()),
        );

        Self {
            db,
            event_bus,
            cancellation_tokens: Arc::new(RwLock::new(HashMap::new())),
            startup_time: Utc::now(),
            store,
            pipeline,
        }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::import_routes())
        .merge(api::position_routes())
        .merge(api::election_routes())
        .merge(api::health_routes())
        .merge(api::event_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
