//! Settings loading
//!
//! Settings live in `settings.json` under the user config directory
//! (`~/.config/duomail/` on Linux). A missing file means defaults.

use anyhow::{Context, Result};
use duomail_core::refresh::RefreshIntervals;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Settings filename in the duomail config directory
const SETTINGS_FILE: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// SQLite database holding accounts, mailboxes and message headers
    pub database_path: PathBuf,
    /// Refresh eligibility intervals
    pub refresh: RefreshIntervals,
    /// How many refresh commands may wait for the sync backend
    pub command_queue_depth: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_path: data_dir().join("duomail.db"),
            refresh: RefreshIntervals::default(),
            command_queue_depth: 100,
        }
    }
}

impl Settings {
    /// Load settings from `path` if given, else from the default location.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None => match config_path() {
                Some(path) if path.exists() => Self::load_file(&path),
                _ => {
                    debug!("No settings file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    /// Load and parse a settings file
    pub fn load_file(path: &Path) -> Result<Self> {
        info!("Loading settings from {}", path.display());
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse settings file: {}", path.display()))
    }
}

/// The duomail config directory
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("duomail"))
}

fn config_path() -> Option<PathBuf> {
    config_dir().map(|p| p.join(SETTINGS_FILE))
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("duomail")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_keep_defaults() {
        let settings: Settings = serde_json::from_str(
            r#"{ "refresh": { "inbox_auto_refresh_min_interval_ms": 2500 } }"#,
        )
        .unwrap();
        assert_eq!(settings.refresh.inbox_auto_refresh_min_interval_ms, 2500);
        assert_eq!(settings.refresh.mailbox_list_min_interval_ms, 30_000);
        assert_eq!(settings.command_queue_depth, 100);
        assert!(settings.database_path.ends_with("duomail.db"));
    }

    #[test]
    fn test_load_file_errors_mention_path() {
        let path = std::env::temp_dir().join("duomail-missing-settings.json");
        let err = Settings::load_file(&path).unwrap_err();
        assert!(err.to_string().contains("duomail-missing-settings.json"));
    }

    #[test]
    fn test_load_file() {
        let path = std::env::temp_dir()
            .join(format!("duomail-settings-{}.json", std::process::id()));
        std::fs::write(&path, r#"{ "database_path": "/tmp/x.db", "command_queue_depth": 4 }"#)
            .unwrap();

        let settings = Settings::load(Some(path.as_path())).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(settings.database_path, PathBuf::from("/tmp/x.db"));
        assert_eq!(settings.command_queue_depth, 4);
        assert_eq!(settings.refresh, RefreshIntervals::default());
    }

    #[test]
    fn test_config_dir() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with("duomail"));
        }
    }
}
