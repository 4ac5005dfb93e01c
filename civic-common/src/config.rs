//! Configuration loading and root folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable naming the root folder
pub const ROOT_FOLDER_ENV: &str = "CIVIC_ROOT_FOLDER";

/// Database file created inside the root folder
pub const DATABASE_FILE: &str = "civic.db";

/// Logging section of the TOML config
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default level when RUST_LOG is unset ("error" .. "trace")
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Service configuration file contents
///
/// Unknown sections are kept as raw TOML so each service can parse its own
/// table (e.g. `[import]`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    pub root_folder: Option<PathBuf>,
    pub bind_address: Option<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub import: Option<toml::Value>,
}

/// Read a TOML config file
pub fn read_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML failed ({}): {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML failed ({}): {}", path.display(), e)))
}

/// Write a TOML config file, creating parent directories
pub fn write_toml_config(config: &TomlConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)
        .map_err(|e| Error::Config(format!("Serialize TOML failed: {}", e)))?;
    std::fs::write(path, content)?;
    Ok(())
}

/// Default config file location for a service (`<config_dir>/civic/<service>.toml`)
pub fn default_config_path(service: &str) -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("civic").join(format!("{}.toml", service)))
}

/// Root folder resolution in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
pub fn resolve_root_folder(cli_arg: Option<&Path>, toml_config: Option<&TomlConfig>) -> PathBuf {
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    if let Ok(path) = std::env::var(ROOT_FOLDER_ENV) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }

    if let Some(root) = toml_config.and_then(|c| c.root_folder.clone()) {
        return root;
    }

    default_root_folder()
}

/// Get OS-dependent default root folder path
fn default_root_folder() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("civic"))
        .unwrap_or_else(|| PathBuf::from("./civic_data"))
}

/// Ensures the root folder exists and derives file locations inside it
pub struct RootFolderInitializer {
    root_folder: PathBuf,
}

impl RootFolderInitializer {
    pub fn new(root_folder: PathBuf) -> Self {
        Self { root_folder }
    }

    /// Create the root folder if missing
    pub fn ensure_directory_exists(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root_folder).map_err(|e| {
            Error::Config(format!(
                "Failed to create root folder {}: {}",
                self.root_folder.display(),
                e
            ))
        })
    }

    /// Path of the shared database file
    pub fn database_path(&self) -> PathBuf {
        self.root_folder.join(DATABASE_FILE)
    }

    pub fn root_folder(&self) -> &Path {
        &self.root_folder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    #[serial]
    fn test_cli_argument_wins() {
        std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
        let resolved = resolve_root_folder(Some(Path::new("/from/cli")), None);
        std::env::remove_var(ROOT_FOLDER_ENV);
        assert_eq!(resolved, PathBuf::from("/from/cli"));
    }

    #[test]
    #[serial]
    fn test_env_beats_toml() {
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        std::env::set_var(ROOT_FOLDER_ENV, "/from/env");
        let resolved = resolve_root_folder(None, Some(&config));
        std::env::remove_var(ROOT_FOLDER_ENV);
        assert_eq!(resolved, PathBuf::from("/from/env"));
    }

    #[test]
    #[serial]
    fn test_toml_used_without_env() {
        std::env::remove_var(ROOT_FOLDER_ENV);
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/from/toml")),
            ..Default::default()
        };
        assert_eq!(
            resolve_root_folder(None, Some(&config)),
            PathBuf::from("/from/toml")
        );
    }

    #[test]
    fn test_toml_round_trip_keeps_import_table() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("civic-positions.toml");

        let mut import = toml::map::Map::new();
        import.insert("row_timeout_ms".to_string(), toml::Value::Integer(250));
        let config = TomlConfig {
            root_folder: Some(PathBuf::from("/data/civic")),
            bind_address: Some("127.0.0.1:5810".to_string()),
            logging: LoggingConfig {
                level: "debug".to_string(),
            },
            import: Some(toml::Value::Table(import)),
        };

        write_toml_config(&config, &path).unwrap();
        let loaded = read_toml_config(&path).unwrap();

        assert_eq!(loaded.root_folder, config.root_folder);
        assert_eq!(loaded.logging.level, "debug");
        let timeout = loaded
            .import
            .as_ref()
            .and_then(|t| t.get("row_timeout_ms"))
            .and_then(|v| v.as_integer());
        assert_eq!(timeout, Some(250));
    }

    #[test]
    fn test_missing_config_is_config_error() {
        let err = read_toml_config(Path::new("/nonexistent/civic.toml")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_database_path_inside_root() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path().join("root");
        let initializer = RootFolderInitializer::new(root.clone());
        initializer.ensure_directory_exists().unwrap();
        assert!(root.is_dir());
        assert_eq!(initializer.database_path(), root.join(DATABASE_FILE));
    }
}
