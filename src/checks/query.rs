//! Query verification: list recent traces through the public API.
//!
//! An empty result is not a failure. Ingestion is asynchronous and the
//! trace created moments earlier may not be visible yet.

use super::CheckReport;
use crate::api::PublicApiClient;
use crate::config::ProbeConfig;

pub const NAME: &str = "API Query";

/// Number of traces echoed in the report
const SAMPLE_SIZE: usize = 3;

/// Query `/api/public/traces` and report what came back
pub async fn check_query(config: &ProbeConfig) -> CheckReport {
    let traces = match PublicApiClient::new(config) {
        Ok(client) => client.list_traces(config.query_limit).await,
        Err(e) => Err(e),
    };

    match traces {
        Ok(traces) if traces.is_empty() => CheckReport::warn(
            NAME,
            "WARN: No traces found yet (may need more time to process)",
        ),
        Ok(traces) => {
            tracing::info!("Query returned {} traces", traces.len());
            traces.iter().take(SAMPLE_SIZE).fold(
                CheckReport::pass(
                    NAME,
                    format!("PASS: Found {} trace(s) in Langfuse", traces.len()),
                ),
                |report, trace| report.detail(format!("- {}", trace.describe())),
            )
        }
        Err(e) => {
            tracing::warn!("Query check failed: {}", e);
            CheckReport::fail(NAME, format!("FAIL: API query error - {}", e))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checks::Outcome;

    #[tokio::test]
    async fn test_missing_secret_fails() {
        let report = check_query(&ProbeConfig::default()).await;
        assert_eq!(report.outcome, Outcome::Fail);
        assert!(report.lines[0].contains("LANGFUSE_SECRET_KEY not set"));
    }
}
