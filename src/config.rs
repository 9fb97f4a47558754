//! Runtime configuration
//!
//! A small JSON config file with per-field defaults. A missing or invalid
//! file logs a warning and runs on defaults; configuration is never a fatal
//! startup path.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Station daemon configuration, loaded from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Station latitude in degrees, used for the astro block
    pub latitude: f64,
    /// Station longitude in degrees
    pub longitude: f64,
    /// Fixed UTC offset in hours for calendar boundaries, e.g. -6
    pub tz_offset: i32,
    /// Display name for the offset, e.g. "CST"
    pub tz_name: String,
    /// URL of the sensor bridge exposing the latest sample
    pub bridge_url: String,
    /// Port for the query API
    pub port: u16,
    /// Poll interval in seconds
    pub poll_interval_sec: u64,
    /// Directory for the snapshot file and summary database; defaults to
    /// the platform data dir
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            latitude: 0.0,
            longitude: 0.0,
            tz_offset: 0,
            tz_name: "UTC".to_string(),
            bridge_url: "http://172.17.0.1:7890".to_string(),
            port: 8889,
            poll_interval_sec: 10,
            data_dir: None,
        }
    }
}

impl Config {
    /// Loads configuration from a JSON file, falling back to defaults on a
    /// missing or invalid file.
    pub fn load(path: &Path) -> Self {
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(_) => {
                warn!(path = %path.display(), "config file missing, using defaults");
                return Self::default();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "config file invalid, using defaults");
                Self::default()
            }
        }
    }

    /// Resolves the directory holding the snapshot file and the summary
    /// database: the configured `data_dir`, else the platform data dir,
    /// else the working directory.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        ProjectDirs::from("", "", "wxhub")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("."))
    }

    /// Path of the persisted state snapshot file.
    pub fn state_path(&self) -> PathBuf {
        self.resolve_data_dir().join("rain_state.json")
    }

    /// Path of the daily summary database.
    pub fn db_path(&self) -> PathBuf {
        self.resolve_data_dir().join("weather_history.sqlite3")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let cfg = Config::default();
        assert_eq!(cfg.port, 8889);
        assert_eq!(cfg.poll_interval_sec, 10);
        assert_eq!(cfg.tz_offset, 0);
        assert_eq!(cfg.tz_name, "UTC");
        assert!(cfg.data_dir.is_none());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let cfg = Config::load(&temp.path().join("nope.json"));
        assert_eq!(cfg.port, 8889);
    }

    #[test]
    fn test_load_invalid_file_uses_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(&path, "{ nope").expect("write");
        let cfg = Config::load(&path);
        assert_eq!(cfg.bridge_url, "http://172.17.0.1:7890");
    }

    #[test]
    fn test_load_partial_file_keeps_other_defaults() {
        let temp = TempDir::new().expect("tempdir");
        let path = temp.path().join("config.json");
        fs::write(
            &path,
            r#"{"latitude": 44.9, "longitude": -93.2, "tz_offset": -6, "tz_name": "CST"}"#,
        )
        .expect("write");

        let cfg = Config::load(&path);
        assert!((cfg.latitude - 44.9).abs() < 1e-9);
        assert_eq!(cfg.tz_offset, -6);
        assert_eq!(cfg.tz_name, "CST");
        // Unspecified fields keep their defaults.
        assert_eq!(cfg.port, 8889);
        assert_eq!(cfg.poll_interval_sec, 10);
    }

    #[test]
    fn test_paths_use_configured_data_dir() {
        let cfg = Config {
            data_dir: Some(PathBuf::from("/tmp/wxhub-test")),
            ..Config::default()
        };
        assert_eq!(
            cfg.state_path(),
            PathBuf::from("/tmp/wxhub-test/rain_state.json")
        );
        assert_eq!(
            cfg.db_path(),
            PathBuf::from("/tmp/wxhub-test/weather_history.sqlite3")
        );
    }
}
