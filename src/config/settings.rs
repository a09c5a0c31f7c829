//! Application settings and paths.
//!
//! Manages XDG-compliant paths for the credential store, settings and saved
//! reports.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable holding the config vault passphrase.
pub const PASSPHRASE_ENV: &str = "ROLLCALL_PASSPHRASE";

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/rollcall)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/rollcall)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Resolve the per-user directories and make sure they exist.
    pub fn discover() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "rollcall", "rollcall")
            .ok_or(ConfigError::DirectoryNotFound)?;

        Self::rooted(project.config_dir(), project.data_dir())
    }

    /// Use explicit directories, creating them if needed.
    pub fn rooted(config_dir: &Path, data_dir: &Path) -> ConfigResult<Self> {
        fs::create_dir_all(config_dir)?;
        fs::create_dir_all(data_dir)?;

        Ok(Self {
            config_dir: config_dir.to_path_buf(),
            data_dir: data_dir.to_path_buf(),
        })
    }

    /// The credential/profile store.
    pub fn config_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }

    /// The settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Directory for saved scan reports.
    pub fn reports_dir(&self) -> PathBuf {
        self.data_dir.join("reports")
    }
}

/// Application-wide settings. CLI flags take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Number of concurrent scan workers.
    pub default_concurrency: usize,
    /// Timeout per connection attempt, in seconds.
    pub default_timeout_secs: u64,
    /// Ports tried when neither a profile nor a flag gives any.
    pub default_ports: String,
    /// Maximum connection attempts per second, 0 for unlimited.
    pub default_rate_limit: u32,
    /// Save every scan report to the history directory.
    pub auto_save_reports: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_concurrency: 10,
            default_timeout_secs: 30,
            default_ports: "22".to_string(),
            default_rate_limit: 0,
            auto_save_reports: true,
        }
    }
}

impl AppSettings {
    /// Load settings, falling back to defaults when the file is absent.
    pub fn load(paths: &Paths) -> ConfigResult<Self> {
        let file = paths.settings_file();
        if !file.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = AppSettings::default();
        assert_eq!(settings.default_concurrency, 10);
        assert_eq!(settings.default_timeout(), Duration::from_secs(30));
        assert_eq!(settings.default_ports, "22");
    }

    #[test]
    fn test_partial_settings_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("settings.json");
        fs::write(&file, r#"{"default_concurrency": 4}"#).unwrap();

        let settings = AppSettings::load_from(&file).unwrap();
        assert_eq!(settings.default_concurrency, 4);
        assert_eq!(settings.default_timeout_secs, 30);
    }

    #[test]
    fn test_load_from_paths() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::rooted(&dir.path().join("cfg"), &dir.path().join("data")).unwrap();

        assert_eq!(AppSettings::load(&paths).unwrap().default_rate_limit, 0);

        fs::write(paths.settings_file(), r#"{"default_rate_limit": 50}"#).unwrap();
        assert_eq!(AppSettings::load(&paths).unwrap().default_rate_limit, 50);
        assert!(paths.reports_dir().starts_with(dir.path()));
    }
}
