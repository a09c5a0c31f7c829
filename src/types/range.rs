//! Range specification types with CIDR, span and hostname support.
//!
//! A profile stores its ranges as plain strings; this module gives them
//! meaning. Supported forms:
//! - Single IP addresses (IPv4 and IPv6)
//! - CIDR notation (192.168.1.0/24)
//! - Bounded spans (192.168.1.1-192.168.1.10)
//! - Hostnames (db01.example.com), passed through unresolved

use ipnetwork::IpNetwork;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

/// Error type for range parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    #[error("invalid range format: {0}")]
    InvalidFormat(String),
    #[error("invalid CIDR notation: {0}")]
    InvalidCidr(String),
    #[error("invalid address span '{0}': start is after end or families differ")]
    InvalidSpan(String),
    #[error("range too large: {0} addresses (max: {1})")]
    TooLarge(u128, u128),
}

/// One parsed range string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RangeSpec {
    /// A single IP address.
    Single(IpAddr),
    /// A CIDR network range.
    Cidr(IpNetwork),
    /// An inclusive start-end span of same-family addresses.
    Span(IpAddr, IpAddr),
    /// A hostname, left for the transport to resolve.
    Hostname(String),
}

impl RangeSpec {
    /// Maximum number of hosts a single range may expand to.
    pub const MAX_HOSTS: u128 = 65536; // a /16 for IPv4

    /// Parse a range specification from a string.
    pub fn parse(s: &str) -> Result<Self, RangeError> {
        let s = s.trim();

        if let Ok(ip) = s.parse::<IpAddr>() {
            return Ok(Self::Single(ip));
        }

        if s.contains('/') {
            let network: IpNetwork = s
                .parse()
                .map_err(|_| RangeError::InvalidCidr(s.to_string()))?;
            let spec = Self::Cidr(network);
            spec.check_size()?;
            return Ok(spec);
        }

        // Hostnames may contain '-', so only treat this as a span when both
        // halves are addresses.
        if let Some((start, end)) = s.split_once('-') {
            if let (Ok(start), Ok(end)) =
                (start.trim().parse::<IpAddr>(), end.trim().parse::<IpAddr>())
            {
                if span_bounds(start, end).is_none() {
                    return Err(RangeError::InvalidSpan(s.to_string()));
                }
                let spec = Self::Span(start, end);
                spec.check_size()?;
                return Ok(spec);
            }
        }

        if is_valid_hostname(s) {
            return Ok(Self::Hostname(s.to_string()));
        }

        Err(RangeError::InvalidFormat(s.to_string()))
    }

    fn check_size(&self) -> Result<(), RangeError> {
        let count = self.host_count();
        if count > Self::MAX_HOSTS {
            return Err(RangeError::TooLarge(count, Self::MAX_HOSTS));
        }
        Ok(())
    }

    /// Number of addresses this range covers before host filtering.
    pub fn host_count(&self) -> u128 {
        match self {
            Self::Single(_) | Self::Hostname(_) => 1,
            // Saturates: a /0 does not fit even in a u128.
            Self::Cidr(network) => {
                let bits = match network {
                    IpNetwork::V4(_) => 32,
                    IpNetwork::V6(_) => 128,
                };
                let host_bits = bits - u32::from(network.prefix().min(bits as u8));
                1u128.checked_shl(host_bits).unwrap_or(u128::MAX)
            }
            Self::Span(start, end) => span_bounds(*start, *end)
                .map_or(0, |(lo, hi)| (hi - lo).saturating_add(1)),
        }
    }

    /// Expand into concrete host strings, in address order.
    pub fn expand(&self) -> Vec<String> {
        match self {
            Self::Single(ip) => vec![ip.to_string()],
            Self::Hostname(hostname) => vec![hostname.clone()],
            Self::Cidr(network) => network
                .iter()
                .filter(|ip| {
                    // Skip network and broadcast addresses for IPv4
                    if let (IpNetwork::V4(net), IpAddr::V4(addr)) = (network, ip) {
                        if net.prefix() < 31 {
                            return *addr != net.network() && *addr != net.broadcast();
                        }
                    }
                    true
                })
                .map(|ip| ip.to_string())
                .collect(),
            Self::Span(start, end) => match (start, end) {
                (IpAddr::V4(start), IpAddr::V4(end)) => (u32::from(*start)..=u32::from(*end))
                    .map(|raw| std::net::Ipv4Addr::from(raw).to_string())
                    .collect(),
                (IpAddr::V6(start), IpAddr::V6(end)) => (u128::from(*start)..=u128::from(*end))
                    .map(|raw| std::net::Ipv6Addr::from(raw).to_string())
                    .collect(),
                _ => Vec::new(),
            },
        }
    }
}

impl FromStr for RangeSpec {
    type Err = RangeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RangeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(ip) => write!(f, "{}", ip),
            Self::Cidr(network) => write!(f, "{}", network),
            Self::Span(start, end) => write!(f, "{}-{}", start, end),
            Self::Hostname(hostname) => write!(f, "{}", hostname),
        }
    }
}

/// Numeric bounds of a span, or None when the families differ or start > end.
fn span_bounds(start: IpAddr, end: IpAddr) -> Option<(u128, u128)> {
    let (lo, hi) = match (start, end) {
        (IpAddr::V4(a), IpAddr::V4(b)) => (u32::from(a) as u128, u32::from(b) as u128),
        (IpAddr::V6(a), IpAddr::V6(b)) => (u128::from(a), u128::from(b)),
        _ => return None,
    };
    (lo <= hi).then_some((lo, hi))
}

/// Check if a string is a valid hostname.
fn is_valid_hostname(s: &str) -> bool {
    if s.is_empty() || s.len() > 253 {
        return false;
    }

    for label in s.split('.') {
        if label.is_empty() || label.len() > 63 {
            return false;
        }
        if !label.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().last().is_some_and(|c| c.is_ascii_alphanumeric()) {
            return false;
        }
        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return false;
        }
    }

    true
}
