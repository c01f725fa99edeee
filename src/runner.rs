//! Probe driver
//!
//! Runs connectivity, trace creation and query verification in order, with
//! a settle delay before the query so ingestion can catch up. A failed check
//! never stops the ones after it.

use std::io::{self, Write};

use crate::checks::{check_connectivity, check_query, check_trace_creation, CheckReport};
use crate::config::ProbeConfig;

const RULE_WIDTH: usize = 60;

/// Reports of a full probe run, in execution order
#[derive(Debug, Clone)]
pub struct ProbeSummary {
    pub reports: Vec<CheckReport>,
}

impl ProbeSummary {
    pub fn all_passed(&self) -> bool {
        self.reports.iter().all(CheckReport::passed)
    }

    /// Process exit status: 0 when every check passed, 1 otherwise
    pub fn exit_code(&self) -> u8 {
        if self.all_passed() {
            0
        } else {
            1
        }
    }

    pub fn get(&self, name: &str) -> Option<&CheckReport> {
        self.reports.iter().find(|r| r.name == name)
    }
}

/// Run all checks against `config`, writing the human-readable report to `out`
pub async fn run_probe<W: Write>(config: &ProbeConfig, out: &mut W) -> io::Result<ProbeSummary> {
    let rule = "=".repeat(RULE_WIDTH);

    writeln!(out, "{}", rule)?;
    writeln!(out, "Langfuse Hook Integration Tests")?;
    writeln!(out, "Target: {}", config.host)?;
    writeln!(out, "{}", rule)?;
    writeln!(out)?;

    let mut reports = Vec::with_capacity(3);

    tracing::info!("Running connectivity check against {}", config.host);
    writeln!(out, "=== Test 1: Langfuse Connection ===")?;
    reports.push(print_report(out, check_connectivity(config).await)?);

    tracing::info!("Running trace creation check");
    writeln!(out, "\n=== Test 2: Trace Creation ===")?;
    reports.push(print_report(out, check_trace_creation(config).await)?);

    tracing::debug!("Waiting {:?} for ingestion", config.settle_delay);
    tokio::time::sleep(config.settle_delay).await;

    tracing::info!("Running query verification check");
    writeln!(out, "\n=== Test 3: API Query ===")?;
    reports.push(print_report(out, check_query(config).await)?);

    let summary = ProbeSummary { reports };

    writeln!(out, "\n{}", rule)?;
    writeln!(out, "Summary")?;
    writeln!(out, "{}", rule)?;
    for report in &summary.reports {
        writeln!(out, "  {}: {}", report.name, report.outcome.label())?;
    }
    writeln!(out)?;

    if summary.all_passed() {
        writeln!(out, "All integration tests passed!")?;
    } else {
        writeln!(out, "Some tests failed.")?;
    }

    Ok(summary)
}

fn print_report<W: Write>(out: &mut W, report: CheckReport) -> io::Result<CheckReport> {
    for line in &report.lines {
        writeln!(out, "{}", line)?;
    }
    Ok(report)
}
