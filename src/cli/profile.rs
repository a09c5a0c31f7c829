//! Profile subcommand implementation.
//!
//! Handles `rollcall profile` for managing scan profiles.

use super::Context;
use crate::config::Profile;
use crate::error::CliResult;
use crate::output;
use crate::types::PortList;
use clap::{ArgGroup, Parser, Subcommand};

/// Manage scan profiles.
#[derive(Parser, Debug)]
pub struct ProfileCommand {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Subcommand, Debug)]
pub enum ProfileAction {
    /// Add a profile
    Add {
        /// Profile name
        #[arg(long)]
        name: String,

        /// Address range: IP, CIDR, start-end span or hostname (repeatable)
        #[arg(long = "range", value_name = "RANGE")]
        ranges: Vec<String>,

        /// SSH ports to try, e.g. "22, 2222"
        #[arg(long, default_value = "22")]
        ports: PortList,

        /// Credential to try, in order (repeatable)
        #[arg(long = "auth", value_name = "AUTH")]
        auths: Vec<String>,
    },

    /// List profiles
    Show,

    /// Remove one profile by name
    Remove {
        /// Profile name
        name: String,
    },

    /// Remove one profile, or all of them
    #[command(group(ArgGroup::new("which").required(true).args(["name", "all"])))]
    Clear {
        /// Profile name
        #[arg(long)]
        name: Option<String>,

        /// Remove every profile
        #[arg(long)]
        all: bool,
    },
}

impl ProfileCommand {
    /// Execute the profile command.
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        match &self.action {
            ProfileAction::Add {
                name,
                ranges,
                ports,
                auths,
            } => {
                let profile = Profile::new(name)
                    .with_ranges(ranges.iter().cloned())
                    .with_credentials(auths.iter().cloned())
                    .with_ports(ports.as_slice().iter().copied());
                add(ctx, profile)
            }
            ProfileAction::Show => show(ctx),
            ProfileAction::Remove { name } => remove(ctx, name),
            ProfileAction::Clear { name: Some(name), .. } => remove(ctx, name),
            ProfileAction::Clear { .. } => clear(ctx),
        }
    }
}

fn add(ctx: &Context, profile: Profile) -> CliResult<()> {
    let mut config = ctx.load_config()?;
    let name = profile.name.clone();

    config.add_profile(profile)?;
    ctx.save_config(&config)?;

    if !ctx.quiet {
        output::print_success(&format!("Profile '{}' added", name));
    }
    Ok(())
}

fn show(ctx: &Context) -> CliResult<()> {
    let config = ctx.load_config()?;

    if config.profiles().is_empty() {
        if !ctx.quiet {
            println!("No profiles found.");
        }
        return Ok(());
    }

    println!("\n{:<15} {:<30} {:<12} {}", "NAME", "RANGES", "PORTS", "AUTH");
    println!("{}", "-".repeat(75));
    for profile in config.profiles() {
        println!(
            "{:<15} {:<30} {:<12} {}",
            profile.name,
            profile.ranges.join(", "),
            profile.ports,
            profile.credential_names.join(", ")
        );
    }
    println!();

    Ok(())
}

fn remove(ctx: &Context, name: &str) -> CliResult<()> {
    let mut config = ctx.load_config()?;

    if !config.remove_profile(name) {
        if !ctx.quiet {
            output::print_warning(&format!("No profile named '{}'", name));
        }
        return Ok(());
    }
    ctx.save_config(&config)?;

    if !ctx.quiet {
        output::print_success(&format!("Profile '{}' removed", name));
    }
    Ok(())
}

fn clear(ctx: &Context) -> CliResult<()> {
    let mut config = ctx.load_config()?;
    config.clear_profiles();
    ctx.save_config(&config)?;

    if !ctx.quiet {
        output::print_success("All profiles removed");
    }
    Ok(())
}
