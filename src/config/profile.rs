//! Scan profile definitions.
//!
//! A profile names a group of target ranges, the ports to try and the
//! ordered credentials to try on each of them.

use crate::types::{Port, PortList};

/// A saved scan target group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// Profile name (used as identifier).
    pub name: String,
    /// Range strings, expanded by the resolver.
    pub ranges: Vec<String>,
    /// Credential names, tried in order.
    pub credential_names: Vec<String>,
    /// Candidate ports, tried in order.
    pub ports: PortList,
}

impl Profile {
    /// Create an empty profile that tries port 22.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ranges: Vec::new(),
            credential_names: Vec::new(),
            ports: PortList::default(),
        }
    }

    #[must_use]
    pub fn with_ranges<I, S>(mut self, ranges: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ranges = ranges.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_credentials<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.credential_names = names.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_ports(mut self, ports: impl IntoIterator<Item = Port>) -> Self {
        self.ports = PortList::new(ports);
        self
    }
}
