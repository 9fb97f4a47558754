//! State snapshot persistence
//!
//! Serializes the full aggregation state to a JSON file on every accepted
//! ingest and restores it at startup, so accumulators survive process
//! restarts. A missing or unparseable file falls back to freshly-initialized
//! defaults; durability is best-effort and never blocks the poller.

use std::fs;
use std::path::PathBuf;

use crate::state::WeatherState;

/// Reads and writes the persisted `WeatherState` snapshot file.
#[derive(Debug, Clone)]
pub struct StatePersistence {
    path: PathBuf,
}

impl StatePersistence {
    /// Creates a persistence handle for the given snapshot file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Writes the state as pretty JSON, creating parent directories as
    /// needed.
    pub fn save(&self, state: &WeatherState) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(state)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

        fs::write(&self.path, json)
    }

    /// Restores a previously saved state.
    ///
    /// Returns `None` if the file doesn't exist or cannot be parsed, in
    /// which case the caller starts from fresh defaults.
    pub fn load(&self) -> Option<WeatherState> {
        let content = fs::read_to_string(&self.path).ok()?;
        serde_json::from_str(&content).ok()
    }
}
