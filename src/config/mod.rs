use directories::BaseDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use thiserror::Error;

const APP_DIR: &str = "time-tracker";
const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine the user config directory")]
    NoConfigDir,
    #[error("failed to read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse {}: {source}", path.display())]
    Parse { path: PathBuf, source: serde_json::Error },
    #[error("failed to write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub spreadsheet_id: String,
    #[serde(default = "default_sheet_name")]
    pub sheet_name: String,
    #[serde(default = "default_hotkey")]
    pub hotkey: String,
}

fn default_sheet_name() -> String {
    "Sheet1".to_string()
}

fn default_hotkey() -> String {
    "ctrl+alt+q".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spreadsheet_id: String::new(),
            sheet_name: default_sheet_name(),
            hotkey: default_hotkey(),
        }
    }
}

impl Config {
    /// Load the persisted configuration, falling back to defaults when the
    /// file is missing or cannot be read.
    pub fn load() -> Self {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(e) => {
                tracing::warn!("{e}, using default configuration");
                Config::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Self {
        match Self::try_load_from(path) {
            Ok(Some(config)) => config,
            Ok(None) => Config::default(),
            Err(e) => {
                tracing::warn!("{e}, using default configuration");
                Config::default()
            }
        }
    }

    fn try_load_from(path: &Path) -> Result<Option<Self>, ConfigError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(ConfigError::Read { path: path.to_path_buf(), source });
            }
        };
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::config_path()?)
    }

    /// Write the configuration through a temp file in the same directory and
    /// rename it over the target, so a failed write never truncates the
    /// previous version.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source| ConfigError::Write { path: path.to_path_buf(), source };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(dir).map_err(write_err)?;

        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| write_err(io::Error::new(io::ErrorKind::InvalidData, e)))?;

        let mut temp_file = NamedTempFile::new_in(dir).map_err(write_err)?;
        temp_file.write_all(contents.as_bytes()).map_err(write_err)?;
        temp_file.as_file().sync_all().map_err(write_err)?;
        temp_file.persist(path).map_err(|e| write_err(e.error))?;

        tracing::info!("Saved configuration to {}", path.display());
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        !self.spreadsheet_id.trim().is_empty()
    }

    /// Per-user application directory holding the config, OAuth files and logs.
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        let base = BaseDirs::new().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.config_dir().join(APP_DIR))
    }

    fn config_path() -> Result<PathBuf, ConfigError> {
        Ok(Self::config_dir()?.join(CONFIG_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.json"));

        assert_eq!(config.hotkey, "ctrl+alt+q");
        assert_eq!(config.sheet_name, "Sheet1");
        assert_eq!(config.spreadsheet_id, "");
        assert!(!config.is_configured());
    }

    #[test]
    fn test_unparsable_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "{ not json").unwrap();

        assert_eq!(Config::load_from(&path), Config::default());
    }

    #[test]
    fn test_partial_document_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"spreadsheet_id": "abc"}"#).unwrap();

        let config = Config::load_from(&path);
        assert_eq!(
            config,
            Config {
                spreadsheet_id: "abc".to_string(),
                sheet_name: "Sheet1".to_string(),
                hotkey: "ctrl+alt+q".to_string(),
            }
        );
        assert!(config.is_configured());
    }

    #[test]
    fn test_save_creates_directories_and_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("time-tracker").join("config.json");

        let config = Config {
            spreadsheet_id: "sheet-id".to_string(),
            sheet_name: "Hours".to_string(),
            hotkey: "ctrl+shift+t".to_string(),
        };
        config.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), config);
    }

    #[test]
    fn test_save_writes_documented_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        Config::default().save_to(&path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["spreadsheet_id"], "");
        assert_eq!(value["sheet_name"], "Sheet1");
        assert_eq!(value["hotkey"], "ctrl+alt+q");
    }

    #[test]
    fn test_save_replaces_previous_version_without_leftovers() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        Config::default().save_to(&path).unwrap();
        let updated = Config { spreadsheet_id: "new".to_string(), ..Config::default() };
        updated.save_to(&path).unwrap();

        assert_eq!(Config::load_from(&path), updated);
        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_save_into_file_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        let err = Config::default().save_to(&blocker.join("config.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Write { .. }));
    }
}
