// BCI Admin Desktop - Persisted key/value store
// JSON files under the app data dir, one per key; window geometry lives here

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tauri::{AppHandle, Manager};
use tracing::warn;

/// Durable key/value store backed by one JSON file per key.
///
/// Persistence here is a convenience, not a correctness requirement: every
/// failure is logged and swallowed, and callers fall back to defaults.
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: PathBuf) -> Self {
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!(dir = %dir.display(), error = %e, "could not create store directory");
        }
        Self { dir }
    }

    pub fn from_app(app: &AppHandle) -> anyhow::Result<Self> {
        let data_dir = app
            .path()
            .app_data_dir()
            .map_err(|e| anyhow::anyhow!("Failed to get app data dir: {}", e))?;
        Ok(Self::new(data_dir))
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }

    /// Read and deserialize a key. Absent or malformed values yield `None`.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.path_for(key);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(key, error = %e, "failed to read stored value");
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(key, error = %e, "stored value is malformed, ignoring");
                None
            }
        }
    }

    /// Serialize and write a key. Failures are logged, never surfaced.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) {
        let path = self.path_for(key);
        let content = match serde_json::to_string_pretty(value) {
            Ok(content) => content,
            Err(e) => {
                warn!(key, error = %e, "failed to serialize value");
                return;
            }
        };
        if let Err(e) = std::fs::write(&path, content) {
            warn!(key, error = %e, "failed to write stored value");
        }
    }

    /// Delete a key. Missing keys are not an error.
    pub fn remove(&self, key: &str) {
        let path = self.path_for(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(key, error = %e, "failed to remove stored value"),
        }
    }
}

/// Persisted geometry of the main window.
///
/// `x`/`y` absent means "let the platform place the window", which is distinct
/// from a stored position of `0,0`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    pub width: f64,
    pub height: f64,
    pub is_maximized: bool,
}

impl Default for WindowState {
    fn default() -> Self {
        Self {
            x: None,
            y: None,
            width: 1200.0,
            height: 800.0,
            is_maximized: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::keys;
    use tempfile::TempDir;

    fn test_store() -> (Store, TempDir) {
        let temp = TempDir::new().unwrap();
        (Store::new(temp.path().to_path_buf()), temp)
    }

    #[test]
    fn window_state_round_trips() {
        let (store, _temp) = test_store();
        let state = WindowState {
            x: Some(10.0),
            y: Some(20.0),
            width: 1200.0,
            height: 800.0,
            is_maximized: false,
        };

        store.save(keys::WINDOW_STATE, &state);
        let loaded: WindowState = store.load(keys::WINDOW_STATE).unwrap();

        assert_eq!(loaded, state);
    }

    #[test]
    fn absent_state_yields_default() {
        let (store, _temp) = test_store();

        let loaded: Option<WindowState> = store.load(keys::WINDOW_STATE);
        let state = loaded.unwrap_or_default();

        assert_eq!(state.width, 1200.0);
        assert_eq!(state.height, 800.0);
        assert!(state.is_maximized);
        assert_eq!(state.x, None);
    }

    #[test]
    fn malformed_value_yields_none() {
        let (store, temp) = test_store();
        std::fs::write(temp.path().join("admin-window-state.json"), "not json").unwrap();

        let loaded: Option<WindowState> = store.load(keys::WINDOW_STATE);

        assert!(loaded.is_none());
    }

    #[test]
    fn absent_position_is_not_zero() {
        let (store, _temp) = test_store();
        store.save(keys::WINDOW_STATE, &WindowState::default());

        let raw: serde_json::Value = store.load(keys::WINDOW_STATE).unwrap();

        assert!(raw.get("x").is_none(), "unset x must not be serialized");
        assert!(raw.get("y").is_none(), "unset y must not be serialized");
    }

    #[test]
    fn remove_clears_key() {
        let (store, _temp) = test_store();
        store.save(keys::AUTH_TOKEN, &"secret".to_string());
        assert!(store.load::<String>(keys::AUTH_TOKEN).is_some());

        store.remove(keys::AUTH_TOKEN);
        // Removing twice is fine.
        store.remove(keys::AUTH_TOKEN);

        assert!(store.load::<String>(keys::AUTH_TOKEN).is_none());
    }
}
