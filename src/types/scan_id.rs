//! Identifiers for scan reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Identifies one scan invocation and its stored report (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(Uuid);

impl ScanId {
    /// Length of the abbreviated form shown in listings.
    pub const SHORT_LEN: usize = 8;

    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// The first eight hex digits, as shown by `history`.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..Self::SHORT_LEN].to_string()
    }

    /// Whether the hyphenated form starts with `prefix` (case-insensitive).
    pub fn matches_prefix(&self, prefix: &str) -> bool {
        self.0
            .to_string()
            .starts_with(&prefix.trim().to_ascii_lowercase())
    }
}

impl Default for ScanId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ScanId {
    type Err = ScanIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ScanIdError::InvalidFormat(s.to_string()))
    }
}

/// Error type for ScanId parsing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ScanIdError {
    #[error("invalid report ID: {0}")]
    InvalidFormat(String),
}
