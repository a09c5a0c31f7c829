//! CLI subcommand definitions and handlers.
//!
//! Implements a git-like subcommand architecture:
//! - `rollcall scan [PROFILE...]` - Log in to hosts and collect facts
//! - `rollcall auth add|show|clear` - Manage credentials
//! - `rollcall profile add|show|clear` - Manage profiles
//! - `rollcall dumpconfig` - Print the stored configuration
//! - `rollcall history` - View saved scans
//! - `rollcall export <scan-id>` - Export a saved scan

mod auth;
mod export;
mod profile;
mod scan;

pub use auth::AuthCommand;
pub use export::ExportCommand;
pub use profile::ProfileCommand;
pub use scan::ScanCommand;

pub use crate::output::OutputFormat;

use crate::config::{codec, AppSettings, Config, ConfigVault, Paths, PlainVault, PASSPHRASE_ENV};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::storage::ReportStore;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// rollcall - inventory a fleet of machines over SSH.
///
/// Profiles group address ranges with the ports and credentials to try on
/// them. A scan logs in to every host in the selected profiles and runs a
/// few diagnostic commands.
#[derive(Parser, Debug)]
#[command(name = "rollcall")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Inventory machines over SSH", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Path to the credential and profile store
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan profiles or ad-hoc ranges
    #[command(alias = "s")]
    Scan(ScanCommand),

    /// Manage credentials
    Auth(AuthCommand),

    /// Manage profiles
    #[command(alias = "p")]
    Profile(ProfileCommand),

    /// Print the stored configuration
    #[command(name = "dumpconfig")]
    DumpConfig(DumpConfigCommand),

    /// View saved scans
    #[command(alias = "h")]
    History(HistoryCommand),

    /// Export a saved scan
    #[command(alias = "e")]
    Export(ExportCommand),
}

/// Print the stored configuration.
#[derive(Parser, Debug)]
pub struct DumpConfigCommand {
    /// Indent the output
    #[arg(long)]
    pub pretty: bool,
}

impl DumpConfigCommand {
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let config = ctx.load_config()?;
        let text = if self.pretty {
            codec::encode_pretty(&config)?
        } else {
            codec::encode(&config)?
        };
        println!("{}", text);
        Ok(())
    }
}

/// View and manage saved scans.
#[derive(Parser, Debug)]
pub struct HistoryCommand {
    /// Number of recent scans to show
    #[arg(short = 'n', long, default_value = "10")]
    pub count: usize,

    /// Delete all saved scans
    #[arg(long)]
    pub clear: bool,
}

impl HistoryCommand {
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = ctx.report_store()?;

        if self.clear {
            let ids = store.list_ids()?;
            for id in &ids {
                store.delete(id)?;
            }
            if !ctx.quiet {
                output::print_success(&format!("Deleted {} saved scans", ids.len()));
            }
            return Ok(());
        }

        output::print_history(&store.list_recent(self.count)?);
        Ok(())
    }
}

/// Everything a command needs from the environment.
pub struct Context {
    pub paths: Paths,
    pub settings: AppSettings,
    pub config_file: PathBuf,
    pub verbose: bool,
    pub quiet: bool,
    passphrase: String,
}

impl Context {
    /// Resolve paths and settings for this invocation.
    pub fn from_cli(cli: &Cli) -> CliResult<Self> {
        let paths = Paths::discover()?;
        let settings = AppSettings::load(&paths)?;
        let config_file = cli.config.clone().unwrap_or_else(|| paths.config_file());

        Ok(Self {
            paths,
            settings,
            config_file,
            verbose: cli.verbose,
            quiet: cli.quiet,
            passphrase: std::env::var(PASSPHRASE_ENV).unwrap_or_default(),
        })
    }

    /// Load the credential/profile store; an absent file is an empty store.
    pub fn load_config(&self) -> CliResult<Config> {
        match PlainVault.read(&self.config_file, &self.passphrase)? {
            Some(text) => Ok(codec::decode(&text)?),
            None => Ok(Config::new()),
        }
    }

    /// Write the store back after a mutation.
    ///
    /// Refuses a store whose profiles name missing credentials, since the
    /// file could not be loaded again.
    pub fn save_config(&self, config: &Config) -> CliResult<()> {
        let dangling = config.dangling_profiles();
        if !dangling.is_empty() {
            return Err(CliError::Other(format!(
                "not saving: profiles reference missing credentials: {}",
                dangling.join(", ")
            )));
        }

        let text = codec::encode(config)?;
        PlainVault.write(&self.config_file, &text, &self.passphrase)?;
        debug!(path = %self.config_file.display(), "saved configuration");
        Ok(())
    }

    pub fn report_store(&self) -> CliResult<ReportStore> {
        Ok(ReportStore::open(self.paths.reports_dir())?)
    }
}
