//! Scan outcomes and the report that collects them.
//!
//! Outcomes carry host and credential names only, never secrets, so a
//! report can be written to disk as-is.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::target::ScanTarget;
use crate::commands::CommandResult;
use crate::error::TransportError;
use crate::types::{Port, ScanId};

/// Why a target produced no session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// The last attempt ran out of time.
    Timeout,
    /// The last attempt reached the host and the credential was refused.
    AuthRejected,
    /// The last attempt could not reach the host.
    Unreachable,
    /// The target had no ports or no credentials to try.
    NoCandidates,
    /// The scan was cancelled before a worker picked the target up.
    Skipped,
    /// The scan was cancelled between attempts on this target.
    Cancelled,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "timeout"),
            Self::AuthRejected => write!(f, "auth rejected"),
            Self::Unreachable => write!(f, "unreachable"),
            Self::NoCandidates => write!(f, "no candidates"),
            Self::Skipped => write!(f, "skipped"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl From<&TransportError> for FailureReason {
    fn from(error: &TransportError) -> Self {
        match error {
            TransportError::Timeout => Self::Timeout,
            TransportError::AuthRejected(_) => Self::AuthRejected,
            TransportError::Unreachable(_) | TransportError::Channel(_) => Self::Unreachable,
        }
    }
}

/// Result for one target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub host: String,
    pub profile: String,
    pub succeeded: bool,
    /// Port of the accepted attempt.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<Port>,
    /// Name of the accepted credential.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub commands: Vec<CommandResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReason>,
    /// Message of the last error observed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    pub attempts: u32,
    pub duration_ms: u64,
}

impl ScanOutcome {
    pub fn success(
        target: &ScanTarget,
        port: Port,
        credential: impl Into<String>,
        commands: Vec<CommandResult>,
    ) -> Self {
        Self {
            host: target.host.clone(),
            profile: target.profile.clone(),
            succeeded: true,
            port: Some(port),
            credential: Some(credential.into()),
            commands,
            failure: None,
            detail: None,
            attempts: 0,
            duration_ms: 0,
        }
    }

    pub fn failure(target: &ScanTarget, reason: FailureReason) -> Self {
        Self {
            host: target.host.clone(),
            profile: target.profile.clone(),
            succeeded: false,
            port: None,
            credential: None,
            commands: Vec::new(),
            failure: Some(reason),
            detail: None,
            attempts: 0,
            duration_ms: 0,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration_ms = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Look up a parsed command field such as `uname.hostname`.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.commands
            .iter()
            .find_map(|result| result.fields.get(key))
            .map(String::as_str)
    }
}

/// Outcome counts for a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Every outcome of one scan invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub id: ScanId,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_ms: u64,
    /// Outcomes in resolution order.
    pub outcomes: Vec<ScanOutcome>,
    /// Requested profiles that did not exist.
    #[serde(default)]
    pub missing_profiles: Vec<String>,
}

impl ScanReport {
    /// Outcome for a host, if it was scanned.
    pub fn get(&self, host: &str) -> Option<&ScanOutcome> {
        self.outcomes.iter().find(|o| o.host == host)
    }

    pub fn summary(&self) -> ScanSummary {
        let mut summary = ScanSummary {
            total: self.outcomes.len(),
            ..ScanSummary::default()
        };
        for outcome in &self.outcomes {
            match outcome.failure {
                None if outcome.succeeded => summary.succeeded += 1,
                Some(FailureReason::Skipped) | Some(FailureReason::Cancelled) => {
                    summary.skipped += 1
                }
                _ => summary.failed += 1,
            }
        }
        summary
    }

    pub fn with_missing_profiles(mut self, missing: Vec<String>) -> Self {
        self.missing_profiles = missing;
        self
    }
}

/// Collects outcomes from concurrent workers.
///
/// Workers may record in any order; `finalize` restores submission order.
#[derive(Debug)]
pub struct ReportAggregator {
    id: ScanId,
    started_at: DateTime<Utc>,
    outcomes: Mutex<BTreeMap<usize, ScanOutcome>>,
}

impl ReportAggregator {
    pub fn new() -> Self {
        Self {
            id: ScanId::new(),
            started_at: Utc::now(),
            outcomes: Mutex::new(BTreeMap::new()),
        }
    }

    /// Record the outcome of the target submitted as `seq`.
    ///
    /// A second outcome for the same sequence number is dropped.
    pub fn record(&self, seq: usize, outcome: ScanOutcome) {
        let mut outcomes = self
            .outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if outcomes.contains_key(&seq) {
            warn!(seq, host = %outcome.host, "duplicate outcome ignored");
            return;
        }
        outcomes.insert(seq, outcome);
    }

    pub fn contains(&self, seq: usize) -> bool {
        self.outcomes
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .contains_key(&seq)
    }

    /// Produce the read-only report, taking every recorded outcome.
    pub fn finalize(&self) -> ScanReport {
        let completed_at = Utc::now();
        let outcomes = std::mem::take(
            &mut *self
                .outcomes
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );

        ScanReport {
            id: self.id,
            started_at: self.started_at,
            completed_at,
            duration_ms: u64::try_from((completed_at - self.started_at).num_milliseconds())
                .unwrap_or(0),
            outcomes: outcomes.into_values().collect(),
            missing_profiles: Vec::new(),
        }
    }
}

impl Default for ReportAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(host: &str) -> ScanTarget {
        ScanTarget::new(host, "lab")
    }

    #[test]
    fn test_finalize_restores_order() {
        let aggregator = ReportAggregator::new();
        aggregator.record(2, ScanOutcome::failure(&target("c"), FailureReason::Timeout));
        aggregator.record(0, ScanOutcome::failure(&target("a"), FailureReason::Unreachable));
        aggregator.record(1, ScanOutcome::success(&target("b"), Port::SSH, "root", Vec::new()));

        let report = aggregator.finalize();
        let hosts: Vec<&str> = report.outcomes.iter().map(|o| o.host.as_str()).collect();
        assert_eq!(hosts, vec!["a", "b", "c"]);
        assert!(report.completed_at >= report.started_at);
    }

    #[test]
    fn test_duplicate_seq_keeps_first() {
        let aggregator = ReportAggregator::new();
        aggregator.record(0, ScanOutcome::failure(&target("a"), FailureReason::Timeout));
        aggregator.record(0, ScanOutcome::success(&target("a"), Port::SSH, "root", Vec::new()));

        let report = aggregator.finalize();
        assert_eq!(report.outcomes.len(), 1);
        assert!(!report.outcomes[0].succeeded);
    }

    #[test]
    fn test_summary_and_lookup() {
        let aggregator = ReportAggregator::new();
        aggregator.record(0, ScanOutcome::success(&target("a"), Port::SSH, "root", Vec::new()));
        aggregator.record(1, ScanOutcome::failure(&target("b"), FailureReason::AuthRejected));
        aggregator.record(2, ScanOutcome::failure(&target("c"), FailureReason::Skipped));

        let report = aggregator.finalize();
        assert_eq!(
            report.summary(),
            ScanSummary {
                total: 3,
                succeeded: 1,
                failed: 1,
                skipped: 1
            }
        );
        assert_eq!(report.get("a").and_then(|o| o.credential.as_deref()), Some("root"));
        assert!(report.get("z").is_none());
    }

    #[test]
    fn test_reason_from_transport_error() {
        assert_eq!(FailureReason::from(&TransportError::Timeout), FailureReason::Timeout);
        assert_eq!(
            FailureReason::from(&TransportError::AuthRejected("denied".into())),
            FailureReason::AuthRejected
        );
        assert_eq!(
            FailureReason::from(&TransportError::Unreachable("refused".into())),
            FailureReason::Unreachable
        );
    }

    #[test]
    fn test_outcome_serialization_has_no_secrets() {
        let outcome = ScanOutcome::success(&target("a"), Port::SSH, "root", Vec::new());
        let json = serde_json::to_string(&outcome).unwrap();
        assert!(json.contains("\"credential\":\"root\""));
        assert!(!json.contains("failure"));
    }
}
