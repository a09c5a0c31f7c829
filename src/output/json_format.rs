//! JSON output formatting.

use crate::scanner::ScanReport;
use std::io::{self, Write};

/// Write the report as pretty-printed JSON.
pub fn write_json<W: Write>(report: &ScanReport, mut out: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut out, report).map_err(io::Error::other)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner::{ReportAggregator, ScanOutcome, ScanTarget};
    use crate::types::Port;

    #[test]
    fn test_json_round_trips() {
        let aggregator = ReportAggregator::new();
        aggregator.record(
            0,
            ScanOutcome::success(&ScanTarget::new("10.0.0.1", "lab"), Port::SSH, "root", Vec::new()),
        );
        let report = aggregator.finalize();

        let mut buf = Vec::new();
        write_json(&report, &mut buf).unwrap();
        let parsed: ScanReport = serde_json::from_slice(&buf).unwrap();
        assert_eq!(parsed.outcomes, report.outcomes);
    }
}
