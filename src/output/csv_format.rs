//! CSV output formatting.

use crate::scanner::ScanReport;
use std::collections::BTreeSet;
use std::io::{self, Write};

/// Write one row per host. Parsed command fields become extra columns.
pub fn write_csv<W: Write>(report: &ScanReport, out: W) -> io::Result<()> {
    let mut wtr = csv::Writer::from_writer(out);

    let fields: BTreeSet<&str> = report
        .outcomes
        .iter()
        .flat_map(|o| o.commands.iter())
        .flat_map(|c| c.fields.keys().map(String::as_str))
        .collect();

    let mut header = vec![
        "host",
        "profile",
        "status",
        "port",
        "credential",
        "attempts",
        "duration_ms",
        "detail",
    ];
    header.extend(fields.iter().copied());
    wtr.write_record(&header)?;

    for outcome in &report.outcomes {
        let status = match outcome.failure {
            Some(reason) => reason.to_string(),
            None => "success".to_string(),
        };
        let mut row = vec![
            outcome.host.clone(),
            outcome.profile.clone(),
            status,
            outcome.port.map_or(String::new(), |p| p.to_string()),
            outcome.credential.clone().unwrap_or_default(),
            outcome.attempts.to_string(),
            outcome.duration_ms.to_string(),
            outcome.detail.clone().unwrap_or_default(),
        ];
        row.extend(
            fields
                .iter()
                .map(|key| outcome.field(key).unwrap_or_default().to_string()),
        );
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{Command, CommandResult};
    use crate::scanner::{FailureReason, ReportAggregator, ScanOutcome, ScanTarget};
    use crate::types::Port;

    #[test]
    fn test_one_row_per_host() {
        let aggregator = ReportAggregator::new();
        let uname = CommandResult::completed(&Command::uname(), "Linux\nweb01\nx86_64".to_string());
        aggregator.record(
            0,
            ScanOutcome::success(&ScanTarget::new("10.0.0.1", "lab"), Port::SSH, "root", vec![uname]),
        );
        aggregator.record(
            1,
            ScanOutcome::failure(&ScanTarget::new("10.0.0.2", "lab"), FailureReason::AuthRejected)
                .with_attempts(2),
        );

        let mut buf = Vec::new();
        write_csv(&aggregator.finalize(), &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            "host,profile,status,port,credential,attempts,duration_ms,detail,uname.hostname,uname.os,uname.processor"
        );
        assert!(lines[1].starts_with("10.0.0.1,lab,success,22,root,0,0,,web01,Linux,x86_64"));
        assert!(lines[2].starts_with("10.0.0.2,lab,auth rejected,,,2,"));
    }
}
