use crate::tui::app::{PreviewMode, DEFAULT_HISTORY_LIMIT};
use crate::tui::preview::DEFAULT_PREVIEW_BYTES;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "fzgrep";
const CONFIG_FILE: &str = "config.json";
const HISTORY_FILE: &str = "history.json";

/// Application configuration stored in the app data directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Match case exactly instead of ignoring it
    #[serde(default)]
    pub case_sensitive: bool,

    /// Include hidden files and directories
    #[serde(default)]
    pub search_hidden: bool,

    /// Cap on candidates taken from a search tool, None for no cap
    #[serde(default)]
    pub max_results: Option<usize>,

    #[serde(default)]
    pub preview_mode: PreviewMode,

    /// Bytes read per preview
    #[serde(default = "default_preview_max_bytes")]
    pub preview_max_bytes: u64,

    /// Submitted queries kept in history
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    #[serde(default = "default_rg_path")]
    pub rg_path: String,

    #[serde(default = "default_fd_path")]
    pub fd_path: String,
}

fn default_preview_max_bytes() -> u64 {
    DEFAULT_PREVIEW_BYTES
}

fn default_history_limit() -> usize {
    DEFAULT_HISTORY_LIMIT
}

fn default_rg_path() -> String {
    "rg".to_string()
}

fn default_fd_path() -> String {
    "fd".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            case_sensitive: false,
            search_hidden: false,
            max_results: None,
            preview_mode: PreviewMode::default(),
            preview_max_bytes: default_preview_max_bytes(),
            history_limit: default_history_limit(),
            rg_path: default_rg_path(),
            fd_path: default_fd_path(),
        }
    }
}

impl AppConfig {
    /// Load config from the app data directory, or return default if not found
    pub fn load() -> Result<Self> {
        Self::load_from(&get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: AppConfig =
            serde_json::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }

    /// Save config to the app data directory
    pub fn save(&self) -> Result<()> {
        self.save_to(&get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, content).context("Failed to write config file")?;
        Ok(())
    }
}

/// Get the path to the config file
pub fn get_config_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(CONFIG_FILE))
}

/// Get the path to the query history file
pub fn get_history_path() -> Result<PathBuf> {
    let app_dir = get_app_data_dir()?;
    Ok(app_dir.join(HISTORY_FILE))
}

/// Get the application data directory for config and history
pub fn get_app_data_dir() -> Result<PathBuf> {
    let base = if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Application Support"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
    } else {
        // Linux/Unix: use XDG_DATA_HOME or ~/.local/share
        dirs::data_dir()
    };

    let base = base.context("Could not determine app data directory")?;
    let app_dir = base.join(APP_NAME);

    fs::create_dir_all(&app_dir)?;
    Ok(app_dir)
}

/// Read saved queries, oldest first. A missing file is an empty history.
pub fn load_history(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = fs::read_to_string(path).context("Failed to read history file")?;
    let history: Vec<String> =
        serde_json::from_str(&content).context("Failed to parse history file")?;
    Ok(history)
}

pub fn save_history(path: &Path, history: &[String]) -> Result<()> {
    let content = serde_json::to_string_pretty(history).context("Failed to serialize history")?;
    fs::write(path, content).context("Failed to write history file")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_app_config_default() {
        let config = AppConfig::default();
        assert!(!config.case_sensitive);
        assert!(!config.search_hidden);
        assert_eq!(config.max_results, None);
        assert_eq!(config.preview_mode, PreviewMode::None);
        assert_eq!(config.preview_max_bytes, 64 * 1024);
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
        assert_eq!(config.rg_path, "rg");
        assert_eq!(config.fd_path, "fd");
    }

    #[test]
    fn test_app_config_serialization() {
        let config = AppConfig {
            case_sensitive: true,
            max_results: Some(500),
            preview_mode: PreviewMode::Bottom,
            ..AppConfig::default()
        };

        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"preview_mode\":\"bottom\""));
        let parsed: AppConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_app_config_partial_json() {
        // Should use defaults for missing fields
        let json = r#"{"search_hidden": true, "rg_path": "/opt/rg"}"#;
        let config: AppConfig = serde_json::from_str(json).unwrap();

        assert!(config.search_hidden);
        assert_eq!(config.rg_path, "/opt/rg");
        assert_eq!(config.fd_path, "fd");
        assert_eq!(config.history_limit, DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn test_app_config_empty_json() {
        let config: AppConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_config_file_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);

        assert_eq!(AppConfig::load_from(&path).unwrap(), AppConfig::default());

        let config = AppConfig {
            history_limit: 10,
            ..AppConfig::default()
        };
        config.save_to(&path).unwrap();
        assert_eq!(AppConfig::load_from(&path).unwrap(), config);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "{ not json").unwrap();
        assert!(AppConfig::load_from(&path).is_err());
    }

    #[test]
    fn test_history_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(HISTORY_FILE);

        assert!(load_history(&path).unwrap().is_empty());

        let history = vec!["foo".to_string(), "bar baz".to_string()];
        save_history(&path, &history).unwrap();
        assert_eq!(load_history(&path).unwrap(), history);
    }
}
