use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::studio::options::PersistedState;

/// Keeps the studio options and theme in a small JSON file between runs.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Missing or unreadable state falls back to the defaults.
    pub fn load(&self) -> PersistedState {
        let body = match fs::read_to_string(&self.path) {
            Ok(body) => body,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!("No saved studio state at {}", self.path.display());
                return PersistedState::default();
            }
            Err(err) => {
                warn!(
                    "Failed to read studio state '{}': {}",
                    self.path.display(),
                    err
                );
                return PersistedState::default();
            }
        };

        match serde_json::from_str::<PersistedState>(&body) {
            Ok(state) => state,
            Err(err) => {
                warn!(
                    "Failed to parse studio state '{}': {}; using defaults",
                    self.path.display(),
                    err
                );
                PersistedState::default()
            }
        }
    }

    pub fn save(&self, state: &PersistedState) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|err| {
                anyhow!(
                    "Failed to create state directory '{}': {}",
                    parent.display(),
                    err
                )
            })?;
        }

        let body = serde_json::to_string_pretty(state)?;
        let file_name = self
            .path
            .file_name()
            .map(|value| value.to_string_lossy().to_string())
            .unwrap_or_else(|| "studio_state.json".to_string());
        let temp_suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let temp_path = self
            .path
            .with_file_name(format!("{file_name}.tmp.{temp_suffix}"));

        fs::write(&temp_path, body).map_err(|err| {
            anyhow!(
                "Failed writing temp state file for '{}': {}",
                self.path.display(),
                err
            )
        })?;
        fs::rename(&temp_path, &self.path)
            .map_err(|err| anyhow!("Failed replacing '{}': {}", self.path.display(), err))?;
        Ok(())
    }
}
