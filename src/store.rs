use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::app_dirs::AppDirs;
use crate::ledger::{RankingEntry, RankingLedger};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode game data: {0}")]
    Json(#[from] serde_json::Error),
}

pub const DEFAULT_BGM_VOLUME: f64 = 0.22;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub bgm_enabled: bool,
    pub bgm_volume: f64,
    pub sfx_volume: f64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bgm_enabled: true,
            bgm_volume: DEFAULT_BGM_VOLUME,
            sfx_volume: 1.0,
        }
    }
}

impl Settings {
    /// Volumes forced into [0, 1]; NaN falls back to the default
    pub fn clamped(self) -> Self {
        let fix = |v: f64, fallback: f64| if v.is_nan() { fallback } else { v.clamp(0.0, 1.0) };
        let defaults = Settings::default();
        Self {
            bgm_enabled: self.bgm_enabled,
            bgm_volume: fix(self.bgm_volume, defaults.bgm_volume),
            sfx_volume: fix(self.sfx_volume, defaults.sfx_volume),
        }
    }
}

/// Everything that outlives a single run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    pub rankings: RankingLedger,
    pub settings: Settings,
}

#[derive(Serialize)]
struct Document<'a> {
    rankings: &'a [RankingEntry],
    settings: &'a Settings,
}

impl PersistedState {
    pub fn to_json(&self) -> Result<Vec<u8>, StoreError> {
        let doc = Document {
            rankings: self.rankings.entries(),
            settings: &self.settings,
        };
        Ok(serde_json::to_vec_pretty(&doc)?)
    }

    /// Lenient decode: unreadable entries are skipped, unknown settings keys
    /// ignored, and a document that is not JSON at all yields defaults.
    pub fn from_json(bytes: &[u8]) -> Self {
        let doc: Value = match serde_json::from_slice(bytes) {
            Ok(v) => v,
            Err(err) => {
                tracing::warn!("game data is not valid JSON, starting fresh: {err}");
                return Self::default();
            }
        };

        let entries = doc
            .get("rankings")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| match RankingEntry::deserialize(item) {
                        Ok(entry) => Some(entry),
                        Err(err) => {
                            tracing::warn!("skipping unreadable ranking entry: {err}");
                            None
                        }
                    })
                    .collect::<Vec<_>>()
            })
            .unwrap_or_default();

        let settings = doc
            .get("settings")
            .and_then(|s| Settings::deserialize(s).ok())
            .unwrap_or_default()
            .clamped();

        Self {
            rankings: RankingLedger::from_entries(entries),
            settings,
        }
    }
}

/// Persistence boundary. Loading never fails; saving reports but callers are
/// expected to log and carry on.
pub trait StateStore {
    fn load(&self) -> PersistedState;
    fn save(&self, state: &PersistedState) -> Result<(), StoreError>;
}

/// Whole-document JSON file, overwritten on every save
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new() -> Self {
        let path = AppDirs::data_path().unwrap_or_else(|| PathBuf::from("brainage_data.json"));
        Self { path }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for JsonFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl StateStore for JsonFileStore {
    fn load(&self) -> PersistedState {
        match fs::read(&self.path) {
            Ok(bytes) => PersistedState::from_json(&bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => PersistedState::default(),
            Err(err) => {
                tracing::warn!("failed to read {}: {err}", self.path.display());
                PersistedState::default()
            }
        }
    }

    fn save(&self, state: &PersistedState) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let data = state.to_json()?;
        fs::write(&self.path, data).map_err(io_err)
    }
}
