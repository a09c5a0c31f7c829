//! Plain text output formatting.
//!
//! Produces human-readable output with colors and formatting.

use crate::scanner::{FailureReason, ScanOutcome, ScanReport};
use console::{style, Style};
use std::io::{self, Write};
use std::time::Duration;

const RULE: &str = "═══════════════════════════════════════════════════════════════════════";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────────────";

/// Write a report as a human-readable table.
pub fn write_plain<W: Write>(report: &ScanReport, mut out: W) -> io::Result<()> {
    let summary = report.summary();

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out, "                    {} Scan Report", style("rollcall").cyan().bold())?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    writeln!(out, "  {} {}", style("Scan ID:").bold(), style(report.id.short()).dim())?;
    writeln!(
        out,
        "  {} {}",
        style("Started:").bold(),
        report.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(
        out,
        "  {} {} hosts in {:.2}s",
        style("Statistics:").bold(),
        summary.total,
        report.duration_ms as f64 / 1000.0
    )?;
    writeln!(
        out,
        "              {} logged in, {} failed, {} skipped",
        style(summary.succeeded).green().bold(),
        style(summary.failed).red(),
        style(summary.skipped).yellow()
    )?;
    writeln!(out)?;

    if report.outcomes.is_empty() {
        writeln!(out, "  {}", style("No hosts to display.").dim())?;
    } else {
        writeln!(out, "  {}", style(THIN_RULE).dim())?;
        writeln!(
            out,
            "  {:<18} {:<12} {:<14} {:>5}  {:<12} {}",
            style("HOST").bold(),
            style("PROFILE").bold(),
            style("STATUS").bold(),
            style("PORT").bold(),
            style("CREDENTIAL").bold(),
            style("SYSTEM").bold()
        )?;
        writeln!(out, "  {}", style(THIN_RULE).dim())?;

        for outcome in &report.outcomes {
            write_row(&mut out, outcome)?;
        }

        writeln!(out, "  {}", style(THIN_RULE).dim())?;
    }

    if !report.missing_profiles.is_empty() {
        writeln!(out)?;
        writeln!(
            out,
            "  {} {}",
            style("Unknown profiles:").yellow().bold(),
            report.missing_profiles.join(", ")
        )?;
    }

    writeln!(out)?;
    writeln!(out, "{}", style(RULE).cyan())?;
    writeln!(out)?;

    Ok(())
}

fn write_row<W: Write>(out: &mut W, outcome: &ScanOutcome) -> io::Result<()> {
    let (status, status_style) = match outcome.failure {
        None => ("ok".to_string(), Style::new().green().bold()),
        Some(reason @ (FailureReason::Skipped | FailureReason::Cancelled)) => {
            (reason.to_string(), Style::new().yellow())
        }
        Some(reason) => (reason.to_string(), Style::new().red()),
    };

    let system = if outcome.succeeded {
        describe_system(outcome)
    } else {
        outcome.detail.clone().unwrap_or_default()
    };

    writeln!(
        out,
        "  {:<18} {:<12} {:<14} {:>5}  {:<12} {}",
        truncate_string(&outcome.host, 18),
        truncate_string(&outcome.profile, 12),
        status_style.apply_to(status),
        outcome.port.map_or(String::new(), |p| p.to_string()),
        truncate_string(outcome.credential.as_deref().unwrap_or(""), 12),
        style(truncate_string(&system, 40)).dim()
    )
}

/// Short description from parsed command fields, e.g. `web01 Linux x86_64`.
fn describe_system(outcome: &ScanOutcome) -> String {
    let mut parts: Vec<&str> = ["uname.hostname", "uname.os", "uname.processor"]
        .iter()
        .filter_map(|key| outcome.field(key))
        .collect();

    if let (Some(name), Some(version)) = (
        outcome.field("redhat-release.name"),
        outcome.field("redhat-release.version"),
    ) {
        parts.push(name);
        parts.push(version);
    }

    parts.join(" ")
}

/// Print a line per stored report, most recent first.
pub fn print_history(reports: &[ScanReport]) {
    if reports.is_empty() {
        println!("{}", style("No saved scans.").dim());
        return;
    }

    println!(
        "  {:<10} {:<20} {:>6} {:>6} {:>6}",
        style("ID").bold(),
        style("STARTED").bold(),
        style("HOSTS").bold(),
        style("OK").bold(),
        style("FAILED").bold()
    );
    for report in reports {
        let summary = report.summary();
        println!(
            "  {:<10} {:<20} {:>6} {:>6} {:>6}",
            style(report.id.short()).dim(),
            report.started_at.format("%Y-%m-%d %H:%M:%S"),
            summary.total,
            style(summary.succeeded).green(),
            style(summary.failed).red()
        );
    }
}

/// Print a header before scanning begins.
/// `worst_case` is the longest any single host can take to try every
/// (port, credential) pair.
pub fn print_scan_header(source: &str, hosts: usize, worst_case: Duration) {
    println!();
    println!(
        "{} {} v{}",
        style("Starting").cyan(),
        style("rollcall").cyan().bold(),
        env!("CARGO_PKG_VERSION")
    );
    println!("{} Source: {}", style("•").dim(), style(source).yellow());
    println!(
        "{} Scanning {} hosts...",
        style("•").dim(),
        style(hosts).white().bold()
    );
    println!(
        "{} Up to {}s of login attempts per host",
        style("•").dim(),
        worst_case.as_secs()
    );
    println!();
}

/// Print an error message.
pub fn print_error(msg: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), msg);
}

/// Print a warning message.
pub fn print_warning(msg: &str) {
    eprintln!("{} {}", style("Warning:").yellow().bold(), msg);
}

/// Print a success message.
pub fn print_success(msg: &str) {
    println!("{} {}", style("✓").green().bold(), msg);
}

/// Print an info message.
pub fn print_info(msg: &str) {
    println!("{} {}", style("ℹ").blue().bold(), msg);
}

/// Truncate a string to a maximum number of characters, adding an ellipsis.
fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, CommandResult};
    use crate::scanner::{ReportAggregator, ScanTarget};
    use crate::types::Port;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
    }

    #[test]
    fn test_describe_system() {
        let results = vec![
            CommandResult::completed(&Command::uname(), "Linux\nweb01\nx86_64".to_string()),
            CommandResult::completed(&Command::redhat_release(), "redhat-release\n8.6\n1.el8".to_string()),
        ];
        let outcome =
            ScanOutcome::success(&ScanTarget::new("10.0.0.1", "lab"), Port::SSH, "root", results);

        assert_eq!(describe_system(&outcome), "web01 Linux x86_64 redhat-release 8.6");
    }

    #[test]
    fn test_plain_lists_hosts_and_missing_profiles() {
        let aggregator = ReportAggregator::new();
        aggregator.record(
            0,
            ScanOutcome::failure(&ScanTarget::new("10.0.0.9", "lab"), FailureReason::Timeout),
        );
        let report = aggregator
            .finalize()
            .with_missing_profiles(vec!["ghost".to_string()]);

        let mut buf = Vec::new();
        write_plain(&report, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();

        assert!(text.contains("10.0.0.9"));
        assert!(text.contains("timeout"));
        assert!(text.contains("ghost"));
    }
}
