//! Target resolution.
//!
//! Expands profiles, or a one-off ad-hoc specification, into the flat list
//! of `ScanTarget`s the executor consumes. Unknown profile names are
//! reported back instead of failing the resolution.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::commands::Command;
use crate::config::{Config, Credential, Profile};
use crate::error::{ResolveError, ResolveResult};
use crate::scanner::{ScanTarget, DEFAULT_TIMEOUT};
use crate::types::{PortList, RangeSpec};

/// Profile label given to ad-hoc targets. Shares its name with the
/// credential built from `--username`/`--password`.
pub const ADHOC_PROFILE: &str = "clioptions";

/// A transient, unnamed profile built from command-line input.
#[derive(Debug, Clone, Default)]
pub struct AdHocSpec {
    pub ranges: Vec<String>,
    pub ports: PortList,
    pub credentials: Vec<Arc<Credential>>,
}

/// Result of resolving a set of profile names.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// One target per unique host, in resolution order.
    pub targets: Vec<ScanTarget>,
    /// Requested profile names absent from the store.
    pub missing: Vec<String>,
}

/// Builds scan targets from a borrowed configuration.
pub struct TargetResolver<'a> {
    config: &'a Config,
    commands: Arc<[Command]>,
    timeout: Duration,
}

impl<'a> TargetResolver<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            commands: Command::defaults().into(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_commands(mut self, commands: impl Into<Arc<[Command]>>) -> Self {
        self.commands = commands.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Resolve the named profiles.
    ///
    /// A host already produced by an earlier profile keeps that profile's
    /// ports and credentials. Fails only when a range cannot be parsed.
    pub fn resolve_profiles<S: AsRef<str>>(&self, names: &[S]) -> ResolveResult<Resolution> {
        let mut resolution = Resolution::default();
        let mut seen = HashSet::new();
        let mut shared: HashMap<&str, Arc<Credential>> = HashMap::new();

        for name in names {
            let name = name.as_ref();
            let Some(profile) = self.config.profile(name) else {
                warn!(profile = name, "profile not found");
                if !resolution.missing.iter().any(|m| m == name) {
                    resolution.missing.push(name.to_string());
                }
                continue;
            };

            let credentials = self.credentials_for(profile, &mut shared);
            let hosts = expand_ranges(&profile.name, &profile.ranges)?;
            let before = resolution.targets.len();

            for host in hosts {
                if !seen.insert(host.clone()) {
                    debug!(host = %host, profile = name, "host already resolved by an earlier profile");
                    continue;
                }
                resolution
                    .targets
                    .push(self.target(host, &profile.name, &profile.ports, &credentials));
            }

            debug!(
                profile = name,
                targets = resolution.targets.len() - before,
                "resolved profile"
            );
        }

        Ok(resolution)
    }

    /// Resolve an ad-hoc specification as if it were a single profile.
    pub fn resolve_adhoc(&self, spec: &AdHocSpec) -> ResolveResult<Vec<ScanTarget>> {
        let hosts = expand_ranges(ADHOC_PROFILE, &spec.ranges)?;
        let targets: Vec<ScanTarget> = hosts
            .into_iter()
            .map(|host| self.target(host, ADHOC_PROFILE, &spec.ports, &spec.credentials))
            .collect();

        debug!(targets = targets.len(), "resolved ad-hoc ranges");
        Ok(targets)
    }

    fn target(
        &self,
        host: String,
        profile: &str,
        ports: &PortList,
        credentials: &[Arc<Credential>],
    ) -> ScanTarget {
        ScanTarget::new(host, profile)
            .with_ports(ports.as_slice().iter().copied())
            .with_credentials(credentials.iter().cloned())
            .with_timeout(self.timeout)
            .with_commands(Arc::clone(&self.commands))
    }

    /// Look up a profile's credentials in order, skipping names that are no
    /// longer in the store.
    fn credentials_for<'c>(
        &'c self,
        profile: &Profile,
        shared: &mut HashMap<&'c str, Arc<Credential>>,
    ) -> Vec<Arc<Credential>> {
        let mut resolved = Vec::with_capacity(profile.credential_names.len());

        for name in &profile.credential_names {
            match self.config.credential(name) {
                Some(credential) => {
                    let credential = shared
                        .entry(credential.name())
                        .or_insert_with(|| Arc::new(credential.clone()));
                    resolved.push(Arc::clone(credential));
                }
                None => warn!(
                    profile = %profile.name,
                    credential = %name,
                    "skipping credential no longer in the store"
                ),
            }
        }

        resolved
    }
}

/// Expand range strings into unique hosts, keeping first-seen order.
fn expand_ranges(profile: &str, ranges: &[String]) -> ResolveResult<Vec<String>> {
    let mut seen = HashSet::new();
    let mut hosts = Vec::new();

    for range in ranges {
        let spec = RangeSpec::parse(range).map_err(|source| ResolveError::InvalidRange {
            profile: profile.to_string(),
            range: range.clone(),
            source,
        })?;

        for host in spec.expand() {
            if seen.insert(host.clone()) {
                hosts.push(host);
            }
        }
    }

    Ok(hosts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PasswordCredential;
    use crate::types::Port;

    fn config() -> Config {
        let mut config = Config::new();
        config
            .add_credential(PasswordCredential::new("credA", "root", "a").into())
            .unwrap();
        config
            .add_credential(PasswordCredential::new("credB", "admin", "b").into())
            .unwrap();
        config
            .add_profile(
                Profile::new("p1")
                    .with_ranges(["10.0.0.1", "10.0.0.2"])
                    .with_credentials(["credA", "credB"])
                    .with_ports([Port::SSH, Port::new(2222).unwrap()]),
            )
            .unwrap();
        config
            .add_profile(
                Profile::new("p2")
                    .with_ranges(["10.0.0.2", "10.0.0.3"])
                    .with_credentials(["credB"]),
            )
            .unwrap();
        config
    }

    fn hosts(targets: &[ScanTarget]) -> Vec<&str> {
        targets.iter().map(|t| t.host.as_str()).collect()
    }

    #[test]
    fn test_missing_profile_is_reported() {
        let config = config();
        let resolution = TargetResolver::new(&config)
            .resolve_profiles(&["p1", "missing"])
            .unwrap();

        assert_eq!(hosts(&resolution.targets), vec!["10.0.0.1", "10.0.0.2"]);
        assert_eq!(resolution.missing, vec!["missing".to_string()]);
    }

    #[test]
    fn test_targets_carry_profile_settings() {
        let config = config();
        let resolution = TargetResolver::new(&config)
            .with_timeout(Duration::from_secs(5))
            .resolve_profiles(&["p1"])
            .unwrap();

        let target = &resolution.targets[0];
        assert_eq!(target.profile, "p1");
        assert_eq!(target.ports, vec![Port::SSH, Port::new(2222).unwrap()]);
        let names: Vec<&str> = target.credentials.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["credA", "credB"]);
        assert_eq!(target.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_cross_profile_first_wins() {
        let config = config();
        let resolution = TargetResolver::new(&config)
            .resolve_profiles(&["p1", "p2"])
            .unwrap();

        assert_eq!(
            hosts(&resolution.targets),
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
        assert_eq!(resolution.targets[1].profile, "p1");
        assert_eq!(resolution.targets[2].profile, "p2");
    }

    #[test]
    fn test_dedup_within_profile() {
        let mut config = Config::new();
        config
            .add_profile(Profile::new("lab").with_ranges(["10.0.0.0/30", "10.0.0.1", "10.0.0.2-10.0.0.3"]))
            .unwrap();

        let resolution = TargetResolver::new(&config).resolve_profiles(&["lab"]).unwrap();
        assert_eq!(
            hosts(&resolution.targets),
            vec!["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
    }

    #[test]
    fn test_dangling_credential_is_skipped() {
        let mut config = config();
        config.remove_credential("credA");

        let resolution = TargetResolver::new(&config).resolve_profiles(&["p1"]).unwrap();
        let names: Vec<&str> = resolution.targets[0]
            .credentials
            .iter()
            .map(|c| c.name())
            .collect();
        assert_eq!(names, vec!["credB"]);
    }

    #[test]
    fn test_credentials_shared_between_targets() {
        let config = config();
        let resolution = TargetResolver::new(&config).resolve_profiles(&["p1"]).unwrap();
        assert!(Arc::ptr_eq(
            &resolution.targets[0].credentials[0],
            &resolution.targets[1].credentials[0]
        ));
    }

    #[test]
    fn test_invalid_range_fails() {
        let mut config = Config::new();
        config
            .add_profile(Profile::new("bad").with_ranges(["10.0.0.9-10.0.0.1"]))
            .unwrap();

        let err = TargetResolver::new(&config)
            .resolve_profiles(&["bad"])
            .unwrap_err();
        assert!(matches!(err, ResolveError::InvalidRange { ref profile, .. } if profile == "bad"));
    }

    #[test]
    fn test_resolve_adhoc() {
        let config = Config::new();
        let credential = Arc::new(Credential::from(PasswordCredential::new(ADHOC_PROFILE, "root", "x")));
        let spec = AdHocSpec {
            ranges: vec!["192.168.1.10".to_string(), "db.internal".to_string()],
            ports: "2222".parse().unwrap(),
            credentials: vec![credential],
        };

        let targets = TargetResolver::new(&config).resolve_adhoc(&spec).unwrap();
        assert_eq!(hosts(&targets), vec!["192.168.1.10", "db.internal"]);
        assert!(targets.iter().all(|t| t.profile == ADHOC_PROFILE));
        assert_eq!(targets[0].ports, vec![Port::new(2222).unwrap()]);
    }
}
