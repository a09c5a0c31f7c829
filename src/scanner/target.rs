//! Resolved scan targets.

use std::sync::Arc;
use std::time::Duration;

use crate::commands::Command;
use crate::config::Credential;
use crate::types::Port;

/// Timeout applied to each connection attempt unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// One host with everything needed to scan it.
///
/// Targets are built by the resolver and never change afterwards; workers
/// only read them.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    /// Address or hostname as written in the range.
    pub host: String,
    /// Profile the host was resolved from.
    pub profile: String,
    /// Candidate ports, tried in order.
    pub ports: Vec<Port>,
    /// Candidate credentials, tried in order for each port.
    pub credentials: Vec<Arc<Credential>>,
    /// Per-attempt timeout.
    pub timeout: Duration,
    /// Commands run after a successful login.
    pub commands: Arc<[Command]>,
}

impl ScanTarget {
    pub fn new(host: impl Into<String>, profile: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            profile: profile.into(),
            ports: vec![Port::SSH],
            credentials: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            commands: Command::defaults().into(),
        }
    }

    pub fn with_ports(mut self, ports: impl IntoIterator<Item = Port>) -> Self {
        self.ports = ports.into_iter().collect();
        self
    }

    pub fn with_credentials(mut self, credentials: impl IntoIterator<Item = Arc<Credential>>) -> Self {
        self.credentials = credentials.into_iter().collect();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_commands(mut self, commands: Arc<[Command]>) -> Self {
        self.commands = commands;
        self
    }

    /// Number of (port, credential) pairs that may be tried.
    pub fn max_attempts(&self) -> usize {
        self.ports.len() * self.credentials.len()
    }

    /// Upper bound on connection time spent on this target.
    pub fn worst_case(&self) -> Duration {
        self.timeout
            .saturating_mul(u32::try_from(self.max_attempts()).unwrap_or(u32::MAX))
    }
}
