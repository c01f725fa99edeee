//! Langfuse public API access
//!
//! Basic-auth HTTP plumbing shared by the ingestion client and the trace
//! query used to verify that data arrived.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};

/// Build the `Authorization` value for HTTP Basic auth: `Basic base64(public:secret)`
pub fn basic_auth_header(public_key: &str, secret_key: &str) -> String {
    let encoded = STANDARD.encode(format!("{}:{}", public_key, secret_key));
    format!("Basic {}", encoded)
}

/// Credentials resolved from config, failing early if the secret is absent
#[derive(Clone)]
pub struct Credentials {
    pub public_key: String,
    secret_key: String,
}

impl Credentials {
    pub fn from_config(config: &ProbeConfig) -> Result<Self> {
        let secret_key = config
            .secret_key
            .clone()
            .ok_or(ProbeError::MissingCredential(crate::config::SECRET_KEY_ENV))?;

        Ok(Self {
            public_key: config.public_key.clone(),
            secret_key,
        })
    }

    pub fn authorization(&self) -> String {
        basic_auth_header(&self.public_key, &self.secret_key)
    }
}

/// Build a reqwest client that sends the Basic auth header on every request
pub fn build_http_client(credentials: &Credentials, timeout: Duration) -> Result<reqwest::Client> {
    let mut auth = HeaderValue::from_str(&credentials.authorization())
        .map_err(|e| ProbeError::Config(format!("invalid credentials: {}", e)))?;
    auth.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, auth);

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout)
        .build()
        .map_err(ProbeError::HttpClient)
}

/// Map non-success statuses to probe errors, passing successful responses through
pub async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();

    if status == reqwest::StatusCode::UNAUTHORIZED {
        return Err(ProbeError::Unauthorized);
    }

    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        return Err(ProbeError::RateLimited);
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ProbeError::Api {
            status: status.as_u16(),
            body,
        });
    }

    Ok(response)
}

/// A trace as listed by `GET /api/public/traces`.
///
/// Only the fields the probe reports on are typed; the rest is kept as-is.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceSummary {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TraceSummary {
    /// One-line description used in the probe report
    pub fn describe(&self) -> String {
        format!(
            "{} (session: {})",
            self.name.as_deref().unwrap_or("unnamed"),
            self.session_id.as_deref().unwrap_or("none")
        )
    }
}

#[derive(Debug, Deserialize)]
struct TraceListResponse {
    #[serde(default)]
    data: Vec<TraceSummary>,
}

/// Read-only client for the Langfuse public query API
pub struct PublicApiClient {
    client: reqwest::Client,
    host: String,
}

impl PublicApiClient {
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        let client = build_http_client(&credentials, config.request_timeout)?;

        Ok(Self {
            client,
            host: config.host.clone(),
        })
    }

    /// Fetch the most recent traces
    pub async fn list_traces(&self, limit: u32) -> Result<Vec<TraceSummary>> {
        let url = format!("{}/api/public/traces", self.host);
        tracing::debug!("GET {} (limit={})", url, limit);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit.to_string())])
            .send()
            .await
            .map_err(ProbeError::Connection)?;

        let response = check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(ProbeError::Connection)?;
        let list: TraceListResponse = serde_json::from_str(&body)
            .map_err(|e| ProbeError::Parse(e.to_string()))?;

        Ok(list.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_auth_header() {
        // base64("pk-lf-1:sk-lf-2")
        assert_eq!(
            basic_auth_header("pk-lf-1", "sk-lf-2"),
            "Basic cGstbGYtMTpzay1sZi0y"
        );
    }

    #[test]
    fn test_credentials_require_secret() {
        let config = ProbeConfig::default();
        let err = Credentials::from_config(&config).err().unwrap();
        assert!(matches!(err, ProbeError::MissingCredential(_)));
    }

    #[test]
    fn test_trace_list_tolerates_missing_data() {
        let list: TraceListResponse = serde_json::from_str(r#"{"meta": {}}"#).unwrap();
        assert!(list.data.is_empty());
    }

    #[test]
    fn test_trace_summary_describe() {
        let list: TraceListResponse = serde_json::from_str(
            r#"{"data": [
                {"name": "Turn 1", "sessionId": "test-session-1700000000", "latency": 1.5},
                {"id": "abc"}
            ]}"#,
        )
        .unwrap();

        assert_eq!(
            list.data[0].describe(),
            "Turn 1 (session: test-session-1700000000)"
        );
        assert!(list.data[0].extra.contains_key("latency"));
        assert_eq!(list.data[1].describe(), "unnamed (session: none)");
    }
}
