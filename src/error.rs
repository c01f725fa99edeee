//! Error types for the Langfuse probe

use thiserror::Error;

/// Result type alias for probe operations
pub type Result<T> = std::result::Result<T, ProbeError>;

/// Main error type for the probe
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("{0} not set")]
    MissingCredential(&'static str),

    #[error("{0} not available in this build")]
    MissingDependency(&'static str),

    #[error("Langfuse connection error: {0}")]
    Connection(#[source] reqwest::Error),

    #[error("Langfuse authentication failed")]
    Unauthorized,

    #[error("Rate limited by Langfuse API")]
    RateLimited,

    #[error("Langfuse API error: status {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Langfuse rejected {rejected} of {total} ingestion events: {message}")]
    Rejected {
        rejected: usize,
        total: usize,
        message: String,
    },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

impl ProbeError {
    /// Whether the error was raised before any request left the process
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            ProbeError::MissingCredential(_) | ProbeError::MissingDependency(_)
        )
    }
}

impl From<reqwest::Error> for ProbeError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ProbeError::Parse(e.to_string())
        } else {
            ProbeError::Connection(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credential_message() {
        let err = ProbeError::MissingCredential("LANGFUSE_SECRET_KEY");
        assert_eq!(err.to_string(), "LANGFUSE_SECRET_KEY not set");
        assert!(err.is_precondition());
    }
}
