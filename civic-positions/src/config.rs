//! Import pipeline configuration
//!
//! Priority: environment (`CIVIC_IMPORT_*`) → `[import]` TOML table → defaults.

use civic_common::config::TomlConfig;
use civic_common::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};

/// Tunables for validation, resolution and commit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Upper bound on validating one row, lookups included (default: 5000ms)
    #[serde(default = "default_row_timeout_ms")]
    pub row_timeout_ms: u64,

    /// Minimum similarity for a fuzzy suggestion (default: 0.6)
    #[serde(default = "default_fuzzy_threshold")]
    pub fuzzy_threshold: f64,

    /// Suggestions attached to an unresolved value (default: 5)
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// Accepted `chrono` formats for term dates, tried in order
    #[serde(default = "default_date_formats")]
    pub date_formats: Vec<String>,

    /// Rows validated concurrently (default: 8)
    #[serde(default = "default_validation_concurrency")]
    pub validation_concurrency: usize,

    /// Total backoff budget for a locked database (default: 5000ms)
    #[serde(default = "default_max_lock_wait_ms")]
    pub max_lock_wait_ms: u64,

    /// Emit a progress snapshot every N processed rows (default: 1)
    #[serde(default = "default_progress_every_rows")]
    pub progress_every_rows: usize,
}

fn default_row_timeout_ms() -> u64 {
    5000
}

fn default_fuzzy_threshold() -> f64 {
    0.6
}

fn default_max_suggestions() -> usize {
    5
}

fn default_date_formats() -> Vec<String> {
    vec![
        "%Y-%m-%d".to_string(),
        "%m/%d/%Y".to_string(),
        "%d-%b-%Y".to_string(),
    ]
}

fn default_validation_concurrency() -> usize {
    8
}

fn default_max_lock_wait_ms() -> u64 {
    5000
}

fn default_progress_every_rows() -> usize {
    1
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            row_timeout_ms: default_row_timeout_ms(),
            fuzzy_threshold: default_fuzzy_threshold(),
            max_suggestions: default_max_suggestions(),
            date_formats: default_date_formats(),
            validation_concurrency: default_validation_concurrency(),
            max_lock_wait_ms: default_max_lock_wait_ms(),
            progress_every_rows: default_progress_every_rows(),
        }
    }
}

impl ImportConfig {
    /// Build from the `[import]` table of a service config plus environment
    pub fn resolve(toml_config: Option<&TomlConfig>) -> Result<Self> {
        let mut config = match toml_config.and_then(|c| c.import.clone()) {
            Some(table) => table
                .try_into::<ImportConfig>()
                .map_err(|e| Error::Config(format!("Invalid [import] section: {}", e)))?,
            None => ImportConfig::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        debug!(?config, "Import configuration resolved");
        Ok(config)
    }

    /// Apply `CIVIC_IMPORT_*` overrides; unparseable values are ignored with a warning
    fn apply_env(&mut self, get: impl Fn(&str) -> Option<String>) {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Option<T> {
            let raw = raw?;
            match raw.trim().parse() {
                Ok(v) => Some(v),
                Err(_) => {
                    warn!("Ignoring {}={}: not a valid value", key, raw);
                    None
                }
            }
        }

        if let Some(v) = parse("CIVIC_IMPORT_ROW_TIMEOUT_MS", get("CIVIC_IMPORT_ROW_TIMEOUT_MS")) {
            self.row_timeout_ms = v;
        }
        if let Some(v) = parse("CIVIC_IMPORT_FUZZY_THRESHOLD", get("CIVIC_IMPORT_FUZZY_THRESHOLD")) {
            self.fuzzy_threshold = v;
        }
        if let Some(v) = parse("CIVIC_IMPORT_MAX_SUGGESTIONS", get("CIVIC_IMPORT_MAX_SUGGESTIONS")) {
            self.max_suggestions = v;
        }
        if let Some(v) = parse(
            "CIVIC_IMPORT_VALIDATION_CONCURRENCY",
            get("CIVIC_IMPORT_VALIDATION_CONCURRENCY"),
        ) {
            self.validation_concurrency = v;
        }
        if let Some(v) = parse("CIVIC_IMPORT_MAX_LOCK_WAIT_MS", get("CIVIC_IMPORT_MAX_LOCK_WAIT_MS")) {
            self.max_lock_wait_ms = v;
        }
        if let Some(v) = parse(
            "CIVIC_IMPORT_PROGRESS_EVERY_ROWS",
            get("CIVIC_IMPORT_PROGRESS_EVERY_ROWS"),
        ) {
            self.progress_every_rows = v;
        }
        if let Some(formats) = get("CIVIC_IMPORT_DATE_FORMATS") {
            let formats: Vec<String> = formats
                .split(',')
                .map(|f| f.trim().to_string())
                .filter(|f| !f.is_empty())
                .collect();
            if !formats.is_empty() {
                self.date_formats = formats;
            }
        }
    }

    fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(Error::Config(format!(
                "fuzzy_threshold must be within 0.0..=1.0, got {}",
                self.fuzzy_threshold
            )));
        }
        if self.date_formats.is_empty() {
            return Err(Error::Config("date_formats must not be empty".to_string()));
        }
        if self.validation_concurrency == 0 || self.progress_every_rows == 0 {
            return Err(Error::Config(
                "validation_concurrency and progress_every_rows must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn row_timeout(&self) -> Duration {
        Duration::from_millis(self.row_timeout_ms)
    }

    pub fn max_lock_wait(&self) -> Duration {
        Duration::from_millis(self.max_lock_wait_ms)
    }
}
