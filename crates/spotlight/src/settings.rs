//! Persisted user settings.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use spotlight_core::Settings;

/// The name of the settings file.
pub const SETTINGS_FILE_NAME: &str = "settings.json";

/// Persists [`Settings`] as JSON on disk.
#[derive(Clone, Debug)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    /// Creates a store backed by the file at `path`.
    #[inline]
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    /// Creates a store in the user's configuration directory, if there is
    /// one.
    pub fn in_config_dir() -> Option<Self> {
        config_dir().map(|dir| Self::new(dir.join(SETTINGS_FILE_NAME)))
    }

    /// Returns the path of the settings file.
    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the settings; a missing file yields the defaults.
    pub fn load(&self) -> io::Result<Settings> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Ok(Default::default());
            }
            Err(err) => return Err(err),
        };
        serde_json::from_str(&text).map_err(io::Error::other)
    }

    /// Writes the settings, creating the parent directory if needed.
    pub fn save(&self, settings: &Settings) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let text =
            serde_json::to_string_pretty(settings).map_err(io::Error::other)?;
        fs::write(&self.path, text)
    }
}

/// Returns the directory that holds the spotlight's configuration files.
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("spotlight"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));
        assert_eq!(store.load().unwrap(), Settings::default());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(
            dir.path().join("nested").join(SETTINGS_FILE_NAME),
        );
        store.save(&Settings::with_api_key("secret")).unwrap();

        let text = fs::read_to_string(store.path()).unwrap();
        assert!(text.contains("\"gemini_api_key\""));
        assert_eq!(store.load().unwrap().api_key(), Some("secret"));
    }

    #[test]
    fn test_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = SettingsStore::new(dir.path().join(SETTINGS_FILE_NAME));
        fs::write(store.path(), "{ not json").unwrap();
        assert!(store.load().is_err());
    }
}
