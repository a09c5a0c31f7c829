//! rollcall command-line entry point.

use anyhow::Result;
use clap::Parser;
use rollcall::cli::{Cli, Commands, Context};
use rollcall::output;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(&cli);

    if let Err(e) = run(cli).await {
        output::print_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

fn init_logging(cli: &Cli) {
    let default_level = if cli.verbose {
        "rollcall=debug"
    } else if cli.quiet {
        "error"
    } else {
        "rollcall=warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let ctx = Context::from_cli(&cli)?;

    match &cli.command {
        Commands::Scan(cmd) => cmd.execute(&ctx).await?,
        Commands::Auth(cmd) => cmd.execute(&ctx)?,
        Commands::Profile(cmd) => cmd.execute(&ctx)?,
        Commands::DumpConfig(cmd) => cmd.execute(&ctx)?,
        Commands::History(cmd) => cmd.execute(&ctx)?,
        Commands::Export(cmd) => cmd.execute(&ctx)?,
    }

    Ok(())
}
