//! Auth subcommand implementation.
//!
//! Handles `rollcall auth` for managing stored credentials.

use super::Context;
use crate::config::{Config, Credential, KeyCredential, PasswordCredential};
use crate::error::{CliError, CliResult};
use crate::output;
use clap::{ArgGroup, Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

/// Manage credentials.
#[derive(Parser, Debug)]
pub struct AuthCommand {
    #[command(subcommand)]
    pub action: AuthAction,
}

/// Credential management actions.
#[derive(Subcommand, Debug)]
pub enum AuthAction {
    /// Add a credential
    #[command(group(ArgGroup::new("secret").required(true).args(["password", "file"])))]
    Add {
        /// Credential name
        #[arg(long)]
        name: String,

        /// Login user name
        #[arg(long)]
        username: String,

        /// Login password
        #[arg(long)]
        password: Option<String>,

        /// File containing a private key
        #[arg(long, value_name = "FILE")]
        file: Option<PathBuf>,

        /// Passphrase for the private key
        #[arg(long, requires = "file")]
        passphrase: Option<String>,
    },

    /// List credentials
    Show {
        /// Include private key text
        #[arg(long)]
        keys: bool,
    },

    /// Remove one credential by name
    Remove {
        /// Credential name
        name: String,

        /// Also remove the credential from profiles that use it
        #[arg(long)]
        force: bool,
    },

    /// Remove one credential, or all of them
    #[command(group(ArgGroup::new("which").required(true).args(["name", "all"])))]
    Clear {
        /// Credential name
        #[arg(long)]
        name: Option<String>,

        /// Remove every credential
        #[arg(long)]
        all: bool,

        /// Also remove the credentials from profiles that use them
        #[arg(long)]
        force: bool,
    },
}

impl AuthCommand {
    /// Execute the auth command.
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        match &self.action {
            AuthAction::Add {
                name,
                username,
                password,
                file,
                passphrase,
            } => {
                let credential = match file {
                    Some(path) => {
                        let key = fs::read_to_string(path).map_err(|e| {
                            CliError::Other(format!("cannot read key {}: {}", path.display(), e))
                        })?;
                        let mut key = KeyCredential::new(name, username, key);
                        if let Some(passphrase) = passphrase {
                            key = key.with_passphrase(passphrase);
                        }
                        Credential::from(key)
                    }
                    None => {
                        let password = password.clone().unwrap_or_default();
                        PasswordCredential::new(name, username, password).into()
                    }
                };
                add(ctx, credential)
            }
            AuthAction::Show { keys } => show(ctx, *keys),
            AuthAction::Remove { name, force } => remove(ctx, name, *force),
            AuthAction::Clear {
                name: Some(name),
                force,
                ..
            } => remove(ctx, name, *force),
            AuthAction::Clear { force, .. } => clear(ctx, *force),
        }
    }
}

fn add(ctx: &Context, credential: Credential) -> CliResult<()> {
    let mut config = ctx.load_config()?;
    let name = credential.name().to_string();

    config.add_credential(credential)?;
    ctx.save_config(&config)?;

    if !ctx.quiet {
        output::print_success(&format!("Credential '{}' added", name));
    }
    Ok(())
}

fn show(ctx: &Context, keys: bool) -> CliResult<()> {
    let config = ctx.load_config()?;

    if config.credentials().is_empty() {
        if !ctx.quiet {
            println!("No credentials found.");
        }
        return Ok(());
    }

    println!("\n{:<20} {:<10} {}", "NAME", "TYPE", "USERNAME");
    println!("{}", "-".repeat(50));
    for credential in config.credentials() {
        println!(
            "{:<20} {:<10} {}",
            credential.name(),
            credential.kind(),
            credential.username()
        );
        if let (true, Credential::Key(key)) = (keys, credential) {
            println!("{}", key.key().trim_end());
        }
    }
    println!();

    Ok(())
}

fn remove(ctx: &Context, name: &str, force: bool) -> CliResult<()> {
    let mut config = ctx.load_config()?;

    if !config.remove_credential(name) {
        if !ctx.quiet {
            output::print_warning(&format!("No credential named '{}'", name));
        }
        return Ok(());
    }
    release_profiles(ctx, &mut config, force)?;
    ctx.save_config(&config)?;

    if !ctx.quiet {
        output::print_success(&format!("Credential '{}' removed", name));
    }
    Ok(())
}

fn clear(ctx: &Context, force: bool) -> CliResult<()> {
    let mut config = ctx.load_config()?;
    config.clear_credentials();
    release_profiles(ctx, &mut config, force)?;
    ctx.save_config(&config)?;

    if !ctx.quiet {
        output::print_success("All credentials removed");
    }
    Ok(())
}

/// A saved profile may only name stored credentials, so profiles left
/// pointing at a removed credential block the removal unless forced.
fn release_profiles(ctx: &Context, config: &mut Config, force: bool) -> CliResult<()> {
    let dangling = config.dangling_profiles();
    if dangling.is_empty() {
        return Ok(());
    }
    if !force {
        return Err(CliError::Other(format!(
            "credential still used by profiles: {} (pass --force to remove it from them)",
            dangling.join(", ")
        )));
    }

    let changed = config.drop_dangling_references();
    if !ctx.quiet {
        output::print_warning(&format!(
            "Removed credential references from profiles: {}",
            changed.join(", ")
        ));
    }
    Ok(())
}
