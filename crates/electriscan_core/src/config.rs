//! Storage configuration.
//!
//! # Responsibility
//! - Resolve the household storage directory and autosave period.
//! - Reject unusable settings before any component starts.
//!
//! # Invariants
//! - A constructed `StorageConfig` always points at an existing directory.
//! - The autosave interval is never zero.

use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the storage directory.
pub const STORAGE_DIR_ENV: &str = "ELECTRISCAN_STORAGE_DIR";
pub const DEFAULT_STORAGE_DIR: &str = "../json";
pub const DEFAULT_AUTOSAVE_INTERVAL: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingDirectory(PathBuf),
    NotADirectory(PathBuf),
    InvalidAutosaveInterval,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingDirectory(path) => {
                write!(f, "storage directory does not exist: {}", path.display())
            }
            Self::NotADirectory(path) => {
                write!(f, "storage path is not a directory: {}", path.display())
            }
            Self::InvalidAutosaveInterval => write!(f, "autosave interval must be positive"),
        }
    }
}

impl Error for ConfigError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    storage_dir: PathBuf,
    autosave_interval: Duration,
}

impl StorageConfig {
    /// Validates `storage_dir` eagerly.
    ///
    /// # Errors
    /// - `MissingDirectory` when nothing exists at the path.
    /// - `NotADirectory` when the path is a file.
    pub fn new(storage_dir: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let storage_dir = storage_dir.into();
        if !storage_dir.exists() {
            return Err(ConfigError::MissingDirectory(storage_dir));
        }
        if !storage_dir.is_dir() {
            return Err(ConfigError::NotADirectory(storage_dir));
        }
        Ok(Self {
            storage_dir,
            autosave_interval: DEFAULT_AUTOSAVE_INTERVAL,
        })
    }

    /// Reads `ELECTRISCAN_STORAGE_DIR`, falling back to `../json`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let dir = std::env::var_os(STORAGE_DIR_ENV)
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STORAGE_DIR));
        Self::new(dir)
    }

    pub fn with_autosave_interval(mut self, interval: Duration) -> Result<Self, ConfigError> {
        if interval.is_zero() {
            return Err(ConfigError::InvalidAutosaveInterval);
        }
        self.autosave_interval = interval;
        Ok(self)
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn autosave_interval(&self) -> Duration {
        self.autosave_interval
    }
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, StorageConfig, DEFAULT_AUTOSAVE_INTERVAL};
    use std::time::Duration;

    #[test]
    fn new_rejects_missing_and_file_paths() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert_eq!(
            StorageConfig::new(&missing),
            Err(ConfigError::MissingDirectory(missing.clone()))
        );

        let file = dir.path().join("file.json");
        std::fs::write(&file, "{}").unwrap();
        assert_eq!(
            StorageConfig::new(&file),
            Err(ConfigError::NotADirectory(file.clone()))
        );
    }

    #[test]
    fn autosave_interval_defaults_and_rejects_zero() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path()).unwrap();
        assert_eq!(config.autosave_interval(), DEFAULT_AUTOSAVE_INTERVAL);
        assert_eq!(
            config.clone().with_autosave_interval(Duration::ZERO),
            Err(ConfigError::InvalidAutosaveInterval)
        );
        let fast = config
            .with_autosave_interval(Duration::from_millis(50))
            .unwrap();
        assert_eq!(fast.autosave_interval(), Duration::from_millis(50));
    }
}
