//! The three probe checks and their reports
//!
//! Every check is total: it never returns an error or panics on a failed
//! request. Failures become a [`Outcome::Fail`] report with diagnostic lines.

pub mod connectivity;
pub mod query;
pub mod trace_creation;

pub use connectivity::check_connectivity;
pub use query::check_query;
pub use trace_creation::{check_trace_creation, new_session_id, session_id_at};

/// Result of a single check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Pass,
    /// Passed, with a caveat worth printing
    Warn,
    Fail,
}

impl Outcome {
    pub fn passed(self) -> bool {
        !matches!(self, Outcome::Fail)
    }

    pub fn label(self) -> &'static str {
        if self.passed() {
            "PASS"
        } else {
            "FAIL"
        }
    }
}

/// Named outcome plus the diagnostic lines printed for it
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub name: &'static str,
    pub outcome: Outcome,
    pub lines: Vec<String>,
}

impl CheckReport {
    pub fn pass(name: &'static str, message: impl Into<String>) -> Self {
        Self::new(name, Outcome::Pass, message)
    }

    pub fn warn(name: &'static str, message: impl Into<String>) -> Self {
        Self::new(name, Outcome::Warn, message)
    }

    pub fn fail(name: &'static str, message: impl Into<String>) -> Self {
        Self::new(name, Outcome::Fail, message)
    }

    fn new(name: &'static str, outcome: Outcome, message: impl Into<String>) -> Self {
        Self {
            name,
            outcome,
            lines: vec![message.into()],
        }
    }

    /// Append an indented detail line
    pub fn detail(mut self, line: impl AsRef<str>) -> Self {
        self.lines.push(format!("      {}", line.as_ref()));
        self
    }

    pub fn passed(&self) -> bool {
        self.outcome.passed()
    }
}

/// Render an error with its chain of sources, one cause per line.
///
/// A cause whose message is already part of the line before it is skipped,
/// since wrapping errors often embed their source's text.
pub fn error_chain(err: &(dyn std::error::Error + 'static)) -> Vec<String> {
    let mut lines = vec![err.to_string()];
    let mut last = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !last.contains(&message) {
            lines.push(format!("caused by: {}", message));
        }
        last = message;
        source = cause.source();
    }
    lines
}

/// Run `body` inside a fresh session, then flush and shut it down.
///
/// Release happens whether or not `body` succeeds, so buffered events from a
/// partially built trace are still sent.
#[cfg(feature = "langfuse")]
pub(crate) async fn with_session<T>(
    config: &crate::config::ProbeConfig,
    body: impl FnOnce(&crate::integrations::LangfuseSession) -> crate::error::Result<T>,
) -> crate::error::Result<T> {
    let session = crate::integrations::LangfuseSession::open(config)?;
    let outcome = body(&session);
    let released = session.shutdown().await;

    let value = outcome?;
    released?;
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;

    #[test]
    fn test_warn_counts_as_pass() {
        assert!(Outcome::Pass.passed());
        assert!(Outcome::Warn.passed());
        assert!(!Outcome::Fail.passed());
        assert_eq!(Outcome::Warn.label(), "PASS");
        assert_eq!(Outcome::Fail.label(), "FAIL");
    }

    #[test]
    fn test_detail_lines_are_indented() {
        let report = CheckReport::pass("Connection", "PASS: ok").detail("View at: x");
        assert_eq!(report.lines, vec!["PASS: ok", "      View at: x"]);
    }

    #[test]
    fn test_error_chain_single() {
        let err = ProbeError::Unauthorized;
        assert_eq!(error_chain(&err), vec!["Langfuse authentication failed"]);
    }

    #[derive(Debug)]
    struct Wrapped {
        message: &'static str,
        source: Option<Box<Wrapped>>,
    }

    impl std::fmt::Display for Wrapped {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str(self.message)
        }
    }

    impl std::error::Error for Wrapped {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            self.source
                .as_deref()
                .map(|e| e as &(dyn std::error::Error + 'static))
        }
    }

    #[test]
    fn test_error_chain_skips_embedded_causes() {
        let err = Wrapped {
            message: "connection error: error sending request",
            source: Some(Box::new(Wrapped {
                message: "error sending request",
                source: Some(Box::new(Wrapped {
                    message: "Connection refused (os error 111)",
                    source: None,
                })),
            })),
        };

        assert_eq!(
            error_chain(&err),
            vec![
                "connection error: error sending request",
                "caused by: Connection refused (os error 111)",
            ]
        );
    }

    #[cfg(feature = "langfuse")]
    #[tokio::test]
    async fn test_with_session_checks_credentials_first() {
        let mut called = false;
        let result = with_session(&crate::config::ProbeConfig::default(), |_| {
            called = true;
            Ok(())
        })
        .await;

        assert!(result.is_err());
        assert!(!called);
    }
}
