//! Output formatting module.
//!
//! Provides formatters for plain text, JSON, and CSV output of scan reports.

mod csv_format;
mod json_format;
mod plain;

pub use csv_format::write_csv;
pub use json_format::write_json;
pub use plain::{
    print_error, print_history, print_info, print_scan_header, print_success, print_warning,
    write_plain,
};

use crate::scanner::ScanReport;
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Report output formats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable table.
    #[default]
    Plain,
    /// Pretty-printed JSON.
    Json,
    /// One CSV row per host.
    Csv,
}

/// Write a report in the given format.
pub fn write_report<W: Write>(report: &ScanReport, format: OutputFormat, out: W) -> io::Result<()> {
    match format {
        OutputFormat::Plain => write_plain(report, out),
        OutputFormat::Json => write_json(report, out),
        OutputFormat::Csv => write_csv(report, out),
    }
}

/// Print a report to stdout.
pub fn print_report(report: &ScanReport, format: OutputFormat) -> io::Result<()> {
    write_report(report, format, io::stdout().lock())
}
