//! Scan subcommand implementation.
//!
//! Handles `rollcall scan`, either over saved profiles or over ranges given
//! on the command line.

use super::{Context, OutputFormat};
use crate::commands::Command;
use crate::config::{Config, Credential, PasswordCredential};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::resolver::{AdHocSpec, TargetResolver, ADHOC_PROFILE};
use crate::scanner::{Executor, ExecutorConfig, ScanTarget, SshTransport};
use crate::types::PortList;
use clap::Parser;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Name given to the credential built from `--username`/`--password`.
pub const CLI_CREDENTIAL: &str = ADHOC_PROFILE;

/// Log in to hosts and collect system facts.
#[derive(Parser, Debug)]
pub struct ScanCommand {
    /// Profiles to scan
    #[arg(value_name = "PROFILE")]
    pub profiles: Vec<String>,

    /// Address range to scan without a profile (repeatable)
    ///
    /// Examples:
    ///   192.168.1.10             Single IP address
    ///   db01.example.com         Hostname
    ///   192.168.1.0/24           CIDR range
    ///   192.168.1.10-192.168.1.20  Address span
    #[arg(long = "range", value_name = "RANGE")]
    pub ranges: Vec<String>,

    /// SSH ports to try with --range, e.g. "22, 2222"
    #[arg(long)]
    pub ports: Option<String>,

    /// Stored credential to try with --range (repeatable)
    #[arg(long = "auth", value_name = "AUTH")]
    pub auths: Vec<String>,

    /// User name for a one-off credential
    #[arg(long, conflicts_with = "auths")]
    pub username: Option<String>,

    /// Password for a one-off credential
    #[arg(long, requires = "username")]
    pub password: Option<String>,

    /// Extra command to run on every host (repeatable)
    #[arg(long = "script", value_name = "COMMAND")]
    pub scripts: Vec<String>,

    /// Number of concurrent workers
    #[arg(short = 'c', long)]
    pub concurrency: Option<usize>,

    /// Timeout per connection attempt, in seconds
    ///
    /// A host may take up to ports x credentials x timeout before it fails.
    #[arg(short = 't', long)]
    pub timeout: Option<u64>,

    /// Connection attempts per second (0 = unlimited)
    #[arg(short = 'r', long = "rate")]
    pub rate_limit: Option<u32>,

    /// Output format for the report
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,

    /// Don't save the report to history
    #[arg(long)]
    pub no_save: bool,
}

impl ScanCommand {
    /// Execute the scan command.
    pub async fn execute(&self, ctx: &Context) -> CliResult<()> {
        if self.profiles.is_empty() && self.ranges.is_empty() {
            return Err(CliError::Other(
                "nothing to scan: name a profile or pass --range".to_string(),
            ));
        }

        let config = ctx.load_config()?;
        let (targets, missing) = self.resolve(ctx, &config)?;

        if !missing.is_empty() {
            output::print_warning(&format!(
                "The following profile names were not found: {}",
                missing.join(", ")
            ));
        }

        if !ctx.quiet && self.format == OutputFormat::Plain {
            let worst_case = targets
                .iter()
                .map(ScanTarget::worst_case)
                .max()
                .unwrap_or_default();
            output::print_scan_header(&self.source(), targets.len(), worst_case);
        }

        let executor_config = ExecutorConfig::new(
            self.concurrency
                .unwrap_or(ctx.settings.default_concurrency),
        )
        .with_rate_limit(self.rate_limit.unwrap_or(ctx.settings.default_rate_limit))
        .with_progress(!ctx.quiet && self.format == OutputFormat::Plain);

        let executor = Executor::new(Arc::new(SshTransport::new()), executor_config);
        let cancel = executor.cancellation_token();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, finishing attempts already in flight");
                cancel.cancel();
            }
        });

        let report = executor.run(targets).await.with_missing_profiles(missing);
        interrupt.abort();

        if ctx.settings.auto_save_reports && !self.no_save {
            let path = ctx.report_store()?.save(&report)?;
            info!(id = %report.id, path = %path.display(), "report saved");
        }

        output::print_report(&report, self.format)?;

        if !ctx.quiet && self.format == OutputFormat::Plain && !self.no_save {
            output::print_info(&format!(
                "Export with: rollcall export {}",
                report.id.short()
            ));
        }

        Ok(())
    }

    /// Build the target list. Ad-hoc ranges come first; profile hosts
    /// already covered by them are dropped.
    fn resolve(&self, ctx: &Context, config: &Config) -> CliResult<(Vec<ScanTarget>, Vec<String>)> {
        let timeout = self
            .timeout
            .map(Duration::from_secs)
            .unwrap_or_else(|| ctx.settings.default_timeout());

        let mut commands = Command::defaults();
        commands.extend(Command::scripts(&self.scripts));

        let resolver = TargetResolver::new(config)
            .with_timeout(timeout)
            .with_commands(commands);

        let mut targets = Vec::new();
        if !self.ranges.is_empty() {
            let spec = self.adhoc_spec(ctx, config)?;
            targets = resolver.resolve_adhoc(&spec)?;
        }

        let mut missing = Vec::new();
        if !self.profiles.is_empty() {
            let resolution = resolver.resolve_profiles(self.profiles.as_slice())?;
            let mut seen: HashSet<String> = targets.iter().map(|t| t.host.clone()).collect();
            targets.extend(
                resolution
                    .targets
                    .into_iter()
                    .filter(|t| seen.insert(t.host.clone())),
            );
            missing = resolution.missing;
        }

        Ok((targets, missing))
    }

    fn adhoc_spec(&self, ctx: &Context, config: &Config) -> CliResult<AdHocSpec> {
        let ports: PortList = self
            .ports
            .as_deref()
            .unwrap_or(&ctx.settings.default_ports)
            .parse()?;

        let credentials: Vec<Arc<Credential>> = if let Some(username) = &self.username {
            let password = self.password.clone().unwrap_or_default();
            vec![Arc::new(
                PasswordCredential::new(CLI_CREDENTIAL, username, password).into(),
            )]
        } else {
            self.auths
                .iter()
                .filter_map(|name| {
                    let credential = config.credential(name);
                    if credential.is_none() {
                        warn!(credential = %name, "unknown credential skipped");
                    }
                    credential.cloned().map(Arc::new)
                })
                .collect()
        };

        if credentials.is_empty() {
            output::print_warning("no credentials for --range; pass --auth or --username");
        }

        Ok(AdHocSpec {
            ranges: self.ranges.clone(),
            ports,
            credentials,
        })
    }

    fn source(&self) -> String {
        let mut parts = self.profiles.clone();
        parts.extend(self.ranges.iter().cloned());
        parts.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use crate::config::{AppSettings, Paths, Profile};

    fn scan(args: &[&str]) -> ScanCommand {
        let mut argv = vec!["rollcall", "scan"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Scan(scan) => scan,
            other => panic!("unexpected command: {:?}", other),
        }
    }

    fn context(dir: &std::path::Path) -> Context {
        Context {
            paths: Paths::rooted(&dir.join("cfg"), &dir.join("data")).unwrap(),
            settings: AppSettings::default(),
            config_file: dir.join("cfg").join("config.json"),
            verbose: false,
            quiet: true,
            passphrase: String::new(),
        }
    }

    fn config() -> Config {
        let mut config = Config::new();
        config
            .add_credential(PasswordCredential::new("lab", "root", "pw").into())
            .unwrap();
        config
            .add_profile(
                Profile::new("web")
                    .with_ranges(["10.0.0.1", "10.0.0.2"])
                    .with_credentials(["lab"]),
            )
            .unwrap();
        config
    }

    #[test]
    fn test_adhoc_with_cli_credential() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = scan(&[
            "--range",
            "10.0.0.5",
            "--ports",
            "22,2222",
            "--username",
            "admin",
            "--password",
            "pw",
        ]);

        let spec = cmd.adhoc_spec(&context(dir.path()), &Config::new()).unwrap();
        assert_eq!(spec.ports.len(), 2);
        assert_eq!(spec.credentials.len(), 1);
        assert_eq!(spec.credentials[0].name(), "clioptions");
        assert_eq!(spec.credentials[0].username(), "admin");
    }

    #[test]
    fn test_adhoc_skips_unknown_auth() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = scan(&["--range", "10.0.0.5", "--auth", "lab", "--auth", "nope"]);

        let spec = cmd.adhoc_spec(&context(dir.path()), &config()).unwrap();
        let names: Vec<&str> = spec.credentials.iter().map(|c| c.name()).collect();
        assert_eq!(names, vec!["lab"]);
    }

    #[test]
    fn test_resolve_merges_ranges_and_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = scan(&["web", "ghost", "--range", "10.0.0.2", "--auth", "lab", "-t", "5"]);

        let (targets, missing) = cmd.resolve(&context(dir.path()), &config()).unwrap();
        let hosts: Vec<&str> = targets.iter().map(|t| t.host.as_str()).collect();

        assert_eq!(hosts, vec!["10.0.0.2", "10.0.0.1"]);
        assert_eq!(targets[0].profile, ADHOC_PROFILE);
        assert_eq!(targets[0].timeout, Duration::from_secs(5));
        assert_eq!(missing, vec!["ghost".to_string()]);
    }

    #[test]
    fn test_scripts_are_added() {
        let dir = tempfile::tempdir().unwrap();
        let cmd = scan(&["web", "--script", "cat /etc/hostname", "--script", "uptime"]);

        let (targets, _) = cmd.resolve(&context(dir.path()), &config()).unwrap();
        assert_eq!(targets[0].commands.len(), 4);
        assert_eq!(targets[0].commands[2].command, "cat /etc/hostname");
        assert_eq!(targets[0].commands[2].name, "script.1");
        assert_eq!(targets[0].commands[3].name, "script.2");
    }
}
