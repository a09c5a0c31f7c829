//! Persistence seam for the serialized configuration.
//!
//! The store is handed to a `ConfigVault` as text. The vault decides how the
//! text is protected at rest; `PlainVault` stores it as-is.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::{ConfigError, ConfigResult};

/// Reads and writes serialized configuration text.
pub trait ConfigVault {
    /// Read the stored text, or `None` when nothing has been stored yet.
    fn read(&self, path: &Path, passphrase: &str) -> ConfigResult<Option<String>>;

    /// Replace the stored text.
    fn write(&self, path: &Path, text: &str, passphrase: &str) -> ConfigResult<()>;
}

/// Stores configuration as a plain file. The passphrase is not used.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainVault;

impl ConfigVault for PlainVault {
    fn read(&self, path: &Path, _passphrase: &str) -> ConfigResult<Option<String>> {
        if !path.exists() {
            debug!(path = %path.display(), "no config file yet");
            return Ok(None);
        }

        fs::read_to_string(path)
            .map(Some)
            .map_err(|e| ConfigError::ReadFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
    }

    fn write(&self, path: &Path, text: &str, _passphrase: &str) -> ConfigResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, text).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_none() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        assert_eq!(PlainVault.read(&path, "").unwrap(), None);
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        PlainVault.write(&path, "{\"version\":1}", "pw").unwrap();
        assert_eq!(
            PlainVault.read(&path, "pw").unwrap().as_deref(),
            Some("{\"version\":1}")
        );
    }
}
