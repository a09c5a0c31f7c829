//! Error types for rollcall.
//!
//! Uses `thiserror` for ergonomic error definitions. Each layer gets its own
//! enum; `CliError` gathers them at the command boundary.

use std::path::PathBuf;
use thiserror::Error;

use crate::types::{PortError, RangeError, ScanIdError};

/// Errors raised by mutations of the credential/profile store.
///
/// A failed mutation never changes the store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} '{name}' already exists")]
    DuplicateName { kind: &'static str, name: String },

    #[error("no such credential: {0}")]
    UnknownCredential(String),

    #[error("invalid {kind} name: {reason}")]
    InvalidName { kind: &'static str, reason: String },
}

/// Errors raised while decoding serialized configuration.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("malformed configuration: {0}")]
    Malformed(String),

    #[error("schema error at '{key}': {reason}")]
    Schema { key: String, reason: String },

    #[error("unsupported configuration version: {0}")]
    UnsupportedVersion(i64),

    #[error("unsupported credential type: {0}")]
    UnsupportedType(String),

    #[error("invalid port in profile '{profile}': {value}")]
    InvalidPort { profile: String, value: String },

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl CodecError {
    pub(crate) fn missing(key: &str) -> Self {
        Self::Schema {
            key: key.to_string(),
            reason: "missing required key".to_string(),
        }
    }

    pub(crate) fn extraneous(key: &str) -> Self {
        Self::Schema {
            key: key.to_string(),
            reason: "unexpected key".to_string(),
        }
    }

    pub(crate) fn wrong_type(key: &str, expected: &str) -> Self {
        Self::Schema {
            key: key.to_string(),
            reason: format!("expected {}", expected),
        }
    }
}

/// Errors raised while expanding profiles into scan targets.
#[derive(Error, Debug, Clone)]
pub enum ResolveError {
    #[error("profile '{profile}' has an invalid range '{range}': {source}")]
    InvalidRange {
        profile: String,
        range: String,
        #[source]
        source: RangeError,
    },
}

/// Failure of a single connection attempt or remote command.
///
/// These never escape the executor; they become data in a `ScanOutcome`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection timed out")]
    Timeout,

    #[error("authentication rejected: {0}")]
    AuthRejected(String),

    #[error("host unreachable: {0}")]
    Unreachable(String),

    #[error("channel error: {0}")]
    Channel(String),
}

/// Errors for application paths, settings and the config vault.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a home directory for configuration")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors for the scan report store.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("report not found: {0}")]
    ReportNotFound(String),

    #[error("ambiguous report prefix '{prefix}': {matches} matches")]
    AmbiguousPrefix { prefix: String, matches: usize },

    #[error("storage directory error: {0}")]
    DirectoryError(String),

    #[error("failed to save report: {0}")]
    SaveFailed(String),

    #[error("failed to load report: {0}")]
    LoadFailed(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Top-level error for CLI command handlers.
#[derive(Error, Debug)]
pub enum CliError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Range(#[from] RangeError),

    #[error(transparent)]
    ScanId(#[from] ScanIdError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type CodecResult<T> = Result<T, CodecError>;
pub type ResolveResult<T> = Result<T, ResolveError>;
pub type TransportResult<T> = Result<T, TransportError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
pub type StorageResult<T> = Result<T, StorageError>;
pub type CliResult<T> = Result<T, CliError>;
