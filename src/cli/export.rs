//! Export subcommand implementation.
//!
//! Handles `rollcall export <scan-id>` for writing a saved report out.

use super::{Context, OutputFormat};
use crate::error::{CliError, CliResult};
use crate::output;
use crate::scanner::ScanReport;
use crate::storage::ReportStore;
use crate::types::ScanId;
use clap::Parser;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;

/// Export a saved scan report.
#[derive(Parser, Debug)]
pub struct ExportCommand {
    /// Scan ID or prefix to export
    ///
    /// Can be a full UUID or the first few characters (short ID).
    #[arg(value_name = "SCAN_ID")]
    pub scan_id: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    pub format: OutputFormat,

    /// Output file path (prints to stdout if not specified)
    #[arg(short = 'o', long = "output")]
    pub output_file: Option<PathBuf>,

    /// Export only hosts that accepted a login
    #[arg(long)]
    pub succeeded_only: bool,
}

impl ExportCommand {
    /// Execute the export command.
    pub fn execute(&self, ctx: &Context) -> CliResult<()> {
        let store = ctx.report_store()?;
        let report = self.report(&store)?;

        match &self.output_file {
            Some(path) => {
                let file = File::create(path).map_err(|e| {
                    CliError::Other(format!("failed to write {}: {}", path.display(), e))
                })?;
                output::write_report(&report, self.format, BufWriter::new(file))?;

                if !ctx.quiet {
                    output::print_success(&format!(
                        "Exported scan {} to {}",
                        report.id.short(),
                        path.display()
                    ));
                }
            }
            None => output::print_report(&report, self.format)?,
        }

        Ok(())
    }

    fn report(&self, store: &ReportStore) -> CliResult<ScanReport> {
        let mut report = match self.scan_id.parse::<ScanId>() {
            Ok(id) => store.load(&id)?,
            Err(_) => store.find_by_prefix(&self.scan_id)?,
        };

        if self.succeeded_only {
            report.outcomes.retain(|o| o.succeeded);
        }
        Ok(report)
    }
}
