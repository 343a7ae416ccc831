use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A remembered dataset folder
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct FolderHandle {
    pub path: PathBuf,
    /// Unix timestamp of when the folder was chosen
    pub saved_at: i64,
}

/// Persistent reference to the last opened folder
///
/// Desktop builds store a plain path; sandboxed platforms can store an
/// opaque bookmark behind the same interface.
pub trait FolderBookmarks {
    /// Remember `directory` as the last opened folder
    fn save(&mut self, directory: &Path) -> Result<()>;

    /// The remembered folder, if any
    fn resolve(&self) -> Option<FolderHandle>;

    /// True when the handle no longer points at a usable folder
    fn is_stale(&self, handle: &FolderHandle) -> bool;
}

/// On-disk preferences format
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
struct PreferencesFile {
    #[serde(default)]
    last_directory: Option<FolderHandle>,
}

/// User preferences stored as JSON in the config directory
///
/// - Linux: ~/.config/lora-dataset/preferences.json
/// - macOS: ~/Library/Application Support/lora-dataset/preferences.json
/// - Windows: %APPDATA%\lora-dataset\preferences.json
#[derive(Debug)]
pub struct Preferences {
    path: PathBuf,
    data: PreferencesFile,
}

impl Preferences {
    /// Load preferences from the default location
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => {
                log::warn!("Could not determine config directory; preferences won't persist");
                Self::load_from(PathBuf::from("lora-dataset-preferences.json"))
            }
        }
    }

    /// Load preferences from `path`
    ///
    /// A missing file yields empty preferences. An unreadable or corrupt
    /// file is logged and also yields empty preferences.
    pub fn load_from(path: PathBuf) -> Self {
        let data = match Self::read(&path) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Ignoring preferences: {}", e);
                PreferencesFile::default()
            }
        };
        Preferences { path, data }
    }

    fn default_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir().or_else(dirs::home_dir)?;
        path.push("lora-dataset");
        path.push("preferences.json");
        Some(path)
    }

    fn read(path: &Path) -> Result<PreferencesFile> {
        let json = match fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(PreferencesFile::default())
            }
            Err(e) => return Err(Error::from_io(path, &e)),
        };
        serde_json::from_str(&json).map_err(|e| Error::preferences(path, e))
    }

    fn write(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::from_io(parent, &e))?;
        }
        let json = serde_json::to_string_pretty(&self.data)
            .map_err(|e| Error::preferences(&self.path, e))?;
        fs::write(&self.path, json).map_err(|e| Error::from_io(&self.path, &e))
    }

    /// Path of the preferences file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FolderBookmarks for Preferences {
    fn save(&mut self, directory: &Path) -> Result<()> {
        self.data.last_directory = Some(FolderHandle {
            path: directory.to_path_buf(),
            saved_at: Utc::now().timestamp(),
        });
        self.write()?;
        log::debug!("Remembered folder {}", directory.display());
        Ok(())
    }

    fn resolve(&self) -> Option<FolderHandle> {
        self.data.last_directory.clone()
    }

    fn is_stale(&self, handle: &FolderHandle) -> bool {
        !handle.path.is_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_resolves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = Preferences::load_from(dir.path().join("prefs.json"));
        assert_eq!(prefs.resolve(), None);
    }

    #[test]
    fn test_save_and_resolve_across_loads() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config").join("prefs.json");
        let dataset = dir.path().join("dataset");
        fs::create_dir(&dataset).unwrap();

        let mut prefs = Preferences::load_from(file.clone());
        prefs.save(&dataset).unwrap();

        let reloaded = Preferences::load_from(file);
        let handle = reloaded.resolve().unwrap();
        assert_eq!(handle.path, dataset);
        assert!(handle.saved_at > 0);
        assert!(!reloaded.is_stale(&handle));
    }

    #[test]
    fn test_removed_folder_is_stale() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = dir.path().join("dataset");
        fs::create_dir(&dataset).unwrap();
        let mut prefs = Preferences::load_from(dir.path().join("prefs.json"));
        prefs.save(&dataset).unwrap();

        fs::remove_dir(&dataset).unwrap();

        let handle = prefs.resolve().unwrap();
        assert!(prefs.is_stale(&handle));
    }

    #[test]
    fn test_corrupt_file_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prefs.json");
        fs::write(&file, "{ not json").unwrap();

        let prefs = Preferences::load_from(file.clone());

        assert_eq!(prefs.resolve(), None);
        assert!(matches!(
            Preferences::read(&file),
            Err(Error::Preferences { .. })
        ));
    }

    #[test]
    fn test_unknown_fields_are_tolerated() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prefs.json");
        fs::write(&file, r#"{ "theme": "dark" }"#).unwrap();

        let prefs = Preferences::load_from(file);
        assert_eq!(prefs.resolve(), None);
    }
}
