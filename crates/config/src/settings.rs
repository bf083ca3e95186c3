// Client settings
// Loaded from ~/.config/websheet/settings.json

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Error reading or writing settings.json.
#[derive(Debug)]
pub enum SettingsError {
    /// File could not be read or written
    Io(String),
    /// File is not valid settings JSON
    Parse(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::Io(msg) => write!(f, "I/O error: {}", msg),
            SettingsError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for SettingsError {}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Server
    #[serde(rename = "api.baseUrl")]
    pub api_base_url: String,

    // Viewport
    #[serde(rename = "viewport.width")]
    pub viewport_width: u32,  // columns

    #[serde(rename = "viewport.height")]
    pub viewport_height: u32,  // rows

    #[serde(rename = "viewport.includeFrozenColumnsRows")]
    pub include_frozen_columns_rows: bool,

    // Fetch
    #[serde(rename = "fetch.log")]
    pub fetch_log: bool,

    #[serde(rename = "fetch.timeoutSeconds")]
    pub fetch_timeout_seconds: u64,

    // History
    #[serde(rename = "history.logTokens")]
    pub log_history_tokens: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:12345".to_string(),
            viewport_width: 10,
            viewport_height: 20,
            include_frozen_columns_rows: true,
            fetch_log: false,
            fetch_timeout_seconds: 30,
            log_history_tokens: true,
        }
    }
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        let config_dir = dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("websheet");
        config_dir.join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match Self::load_from(&path) {
            Ok(settings) => settings,
            Err(e) => {
                log::warn!("Error loading {}: {}, using default settings", path.display(), e);
                Self::default()
            }
        }
    }

    /// Load settings from an explicit file. Lines starting with `//` are comments.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|e| SettingsError::Io(e.to_string()))?;
        Self::from_json(&contents)
    }

    pub fn from_json(contents: &str) -> Result<Self, SettingsError> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        let settings: Settings =
            serde_json::from_str(&cleaned).map_err(|e| SettingsError::Parse(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), SettingsError> {
        if self.api_base_url.trim().is_empty() {
            return Err(SettingsError::Parse("api.baseUrl must not be empty".into()));
        }
        if self.viewport_width == 0 || self.viewport_height == 0 {
            return Err(SettingsError::Parse("viewport.width and viewport.height must be at least 1".into()));
        }
        Ok(())
    }

    /// Save settings to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| SettingsError::Io(e.to_string()))?;
        }

        let json = serde_json::to_string_pretty(self)
            .map_err(|e| SettingsError::Parse(e.to_string()))?;

        fs::write(path, json).map_err(|e| SettingsError::Io(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_for_missing_keys() {
        let settings = Settings::from_json(r#"{ "viewport.width": 4 }"#).unwrap();
        assert_eq!(settings.viewport_width, 4);
        assert_eq!(settings.viewport_height, 20);
        assert_eq!(settings.api_base_url, "http://localhost:12345");
    }

    #[test]
    fn test_comment_lines_are_ignored() {
        let json = r#"{
    // Local dev server
    "api.baseUrl": "http://127.0.0.1:8080",
    "fetch.log": true
}"#;
        let settings = Settings::from_json(json).unwrap();
        assert_eq!(settings.api_base_url, "http://127.0.0.1:8080");
        assert!(settings.fetch_log);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Settings::from_json(r#"{ "viewport.height": 0 }"#),
            Err(SettingsError::Parse(_))
        ));
        assert!(matches!(Settings::from_json("not json"), Err(SettingsError::Parse(_))));
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let settings = Settings {
            viewport_width: 12,
            fetch_log: true,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();

        let loaded = Settings::load_from(&path).unwrap();
        assert_eq!(loaded, settings);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load_from(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SettingsError::Io(_)));
    }
}
