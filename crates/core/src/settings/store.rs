//! JSON-backed settings store.

use crate::layout::{MAX_BACKENDS, MIN_BACKENDS};
use crate::settings::error::{SettingsError, SettingsResult};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

pub const DEFAULT_FILE_NAME: &str = "config.json";

const BACKEND_COUNT_KEY: &str = "paper_count";
const PAPER_VERSION_KEY: &str = "paper_version";

/// Reads and writes a flat JSON object.
///
/// The file is re-read on every access so edits made while the panel runs
/// are picked up. Clones share one write lock, so concurrent `set` calls
/// never drop each other's keys.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Store at `config.json` next to the running executable, falling back
    /// to the current directory.
    pub fn beside_executable() -> Self {
        let dir = std::env::current_exe()
            .ok()
            .and_then(|exe| exe.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(dir.join(DEFAULT_FILE_NAME))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the whole settings object.
    ///
    /// A missing file yields an empty map. A file that is not a JSON object
    /// also yields an empty map and logs a warning.
    pub fn load(&self) -> Map<String, Value> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "settings file not readable");
                return Map::new();
            }
        };

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => map,
            Ok(_) => {
                warn!(path = %self.path.display(), "settings file is not a JSON object, ignoring it");
                Map::new()
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "settings file is corrupt, ignoring it");
                Map::new()
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        self.load().remove(key)
    }

    /// Set `key` and write the file back.
    pub fn set(&self, key: &str, value: Value) -> SettingsResult<()> {
        // The guard protects no data, so a poisoned lock is still usable.
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut map = self.load();
        map.insert(key.to_string(), value);
        self.save(&map)
    }

    fn save(&self, map: &Map<String, Value>) -> SettingsResult<()> {
        let content = serde_json::to_string_pretty(map)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        std::fs::write(&self.path, content).map_err(|source| SettingsError::Write {
            path: self.path.clone(),
            source,
        })
    }

    /// Configured number of backends, if set and in range.
    pub fn backend_count(&self) -> Option<u32> {
        self.get(BACKEND_COUNT_KEY)
            .and_then(|v| v.as_u64())
            .and_then(|n| u32::try_from(n).ok())
            .filter(|n| (MIN_BACKENDS..=MAX_BACKENDS).contains(n))
    }

    pub fn set_backend_count(&self, count: u32) -> SettingsResult<()> {
        if !(MIN_BACKENDS..=MAX_BACKENDS).contains(&count) {
            return Err(SettingsError::InvalidValue {
                key: BACKEND_COUNT_KEY.to_string(),
                reason: format!("{count} is outside {MIN_BACKENDS}..={MAX_BACKENDS}"),
            });
        }
        self.set(BACKEND_COUNT_KEY, Value::from(count))
    }

    /// Last backend version used for downloads.
    pub fn paper_version(&self) -> Option<String> {
        self.get(PAPER_VERSION_KEY)
            .and_then(|v| v.as_str().map(str::to_string))
            .filter(|v| !v.trim().is_empty())
    }

    pub fn set_paper_version(&self, version: &str) -> SettingsResult<()> {
        self.set(PAPER_VERSION_KEY, Value::from(version))
    }
}
