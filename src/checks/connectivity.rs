//! Connectivity check: open a session, send one trivial span, release it.

use super::CheckReport;
use crate::config::ProbeConfig;
use crate::error::Result;

pub const NAME: &str = "Connection";

/// Verify the ingestion endpoint accepts a minimal trace
pub async fn check_connectivity(config: &ProbeConfig) -> CheckReport {
    match send_connection_span(config).await {
        Ok(()) => CheckReport::pass(NAME, format!("PASS: Connected to Langfuse at {}", config.host)),
        Err(e) if e.is_precondition() => CheckReport::fail(NAME, format!("FAIL: {}", e)),
        Err(e) => {
            tracing::warn!("Connectivity check failed: {}", e);
            CheckReport::fail(NAME, format!("FAIL: Connection error - {}", e))
        }
    }
}

#[cfg(feature = "langfuse")]
async fn send_connection_span(config: &ProbeConfig) -> Result<()> {
    use crate::integrations::{SpanSpec, TraceUpdate};

    super::with_session(config, |session| {
        let span = session.start_span(SpanSpec::span("connection-test"));
        span.update_trace(TraceUpdate {
            metadata: Some(serde_json::json!({ "test": true })),
            ..Default::default()
        });
        span.end();
        Ok(())
    })
    .await
}

#[cfg(not(feature = "langfuse"))]
async fn send_connection_span(_config: &ProbeConfig) -> Result<()> {
    Err(crate::error::ProbeError::MissingDependency("langfuse client"))
}
