//! Probe configuration
//!
//! Values come from the `LANGFUSE_*` environment variables. Only the secret
//! key is required, and its absence is reported by the checks rather than
//! rejected here.

use std::fmt;
use std::time::Duration;

/// Environment variable holding the Langfuse base URL
pub const HOST_ENV: &str = "LANGFUSE_HOST";
/// Environment variable holding the public key
pub const PUBLIC_KEY_ENV: &str = "LANGFUSE_PUBLIC_KEY";
/// Environment variable holding the secret key
pub const SECRET_KEY_ENV: &str = "LANGFUSE_SECRET_KEY";

pub const DEFAULT_HOST: &str = "http://localhost:3150";
pub const DEFAULT_PUBLIC_KEY: &str = "pk-lf-local-claude-code";

/// Delay between trace creation and query verification, for async ingestion
pub const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(2);
/// Timeout applied to every HTTP request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
/// Number of traces requested by the query check
pub const DEFAULT_QUERY_LIMIT: u32 = 5;

/// Configuration shared by all checks
#[derive(Clone)]
pub struct ProbeConfig {
    pub host: String,
    pub public_key: String,
    pub secret_key: Option<String>,
    pub settle_delay: Duration,
    pub request_timeout: Duration,
    pub query_limit: u32,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            public_key: DEFAULT_PUBLIC_KEY.to_string(),
            secret_key: None,
            settle_delay: DEFAULT_SETTLE_DELAY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl ProbeConfig {
    /// Create config from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create config from an arbitrary variable lookup.
    ///
    /// Empty values count as unset, so `LANGFUSE_SECRET_KEY=` is still a
    /// missing credential.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            host: get(HOST_ENV)
                .map(|h| normalize_host(&h))
                .unwrap_or(defaults.host),
            public_key: get(PUBLIC_KEY_ENV).unwrap_or(defaults.public_key),
            secret_key: get(SECRET_KEY_ENV),
            ..defaults
        }
    }

    pub fn with_host(mut self, host: impl AsRef<str>) -> Self {
        self.host = normalize_host(host.as_ref());
        self
    }

    pub fn with_secret_key(mut self, secret_key: impl Into<String>) -> Self {
        self.secret_key = Some(secret_key.into());
        self
    }

    pub fn with_settle_delay(mut self, delay: Duration) -> Self {
        self.settle_delay = delay;
        self
    }

    /// URL of the session view in the Langfuse UI
    pub fn session_url(&self, session_id: &str) -> String {
        format!("{}/sessions/{}", self.host, session_id)
    }
}

impl fmt::Debug for ProbeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProbeConfig")
            .field("host", &self.host)
            .field("public_key", &self.public_key)
            .field(
                "secret_key",
                &self.secret_key.as_ref().map(|_| "<redacted>"),
            )
            .field("settle_delay", &self.settle_delay)
            .field("request_timeout", &self.request_timeout)
            .field("query_limit", &self.query_limit)
            .finish()
    }
}

/// Strip trailing slashes so paths can be appended with `format!`
pub fn normalize_host(host: &str) -> String {
    host.trim().trim_end_matches('/').to_string()
}
