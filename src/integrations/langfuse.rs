//! Langfuse ingestion client
//!
//! A small client for the Langfuse batch ingestion API:
//! - a [`LangfuseSession`] buffers trace and observation events
//! - [`SpanHandle`]s open nested spans and generations and record updates
//! - [`LangfuseSession::flush`] posts the buffer to `/api/public/ingestion`
//!
//! Spans are closed explicitly with [`SpanHandle::end`] or implicitly on
//! drop, which records the end time as an update event.
//!
//! All code is feature-gated behind `#[cfg(feature = "langfuse")]`

use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::api::{build_http_client, check_status, Credentials};
use crate::config::ProbeConfig;
use crate::error::{ProbeError, Result};

/// Maximum number of events sent in a single ingestion request
pub const MAX_BATCH_EVENTS: usize = 100;

/// Observation type of a span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObservationKind {
    Span,
    Generation,
}

/// Parameters for opening a span or generation
#[derive(Debug, Clone, Default)]
pub struct SpanSpec {
    pub name: String,
    pub kind: Option<ObservationKind>,
    pub model: Option<String>,
    pub input: Option<Value>,
    pub output: Option<Value>,
    pub metadata: Option<Value>,
}

impl SpanSpec {
    pub fn span(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(ObservationKind::Span),
            ..Default::default()
        }
    }

    pub fn generation(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: Some(ObservationKind::Generation),
            model: Some(model.into()),
            ..Default::default()
        }
    }

    pub fn input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn output(mut self, output: Value) -> Self {
        self.output = Some(output);
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    fn kind(&self) -> ObservationKind {
        self.kind.unwrap_or(ObservationKind::Span)
    }
}

/// Trace-level attributes set from inside a span
#[derive(Debug, Clone, Default)]
pub struct TraceUpdate {
    pub session_id: Option<String>,
    pub user_id: Option<String>,
    pub tags: Option<Vec<String>>,
    pub metadata: Option<Value>,
}

/// Trace body of a `trace-create` event. Langfuse upserts traces by id, so
/// later events only carry the fields being changed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceBody {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Observation body shared by span and generation events
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationBody {
    pub id: String,
    pub trace_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_observation_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

/// Typed payload of an ingestion event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "body", rename_all = "kebab-case")]
pub enum IngestionPayload {
    TraceCreate(TraceBody),
    SpanCreate(ObservationBody),
    SpanUpdate(ObservationBody),
    GenerationCreate(ObservationBody),
    GenerationUpdate(ObservationBody),
}

impl IngestionPayload {
    fn create(kind: ObservationKind, body: ObservationBody) -> Self {
        match kind {
            ObservationKind::Span => Self::SpanCreate(body),
            ObservationKind::Generation => Self::GenerationCreate(body),
        }
    }

    fn update(kind: ObservationKind, body: ObservationBody) -> Self {
        match kind {
            ObservationKind::Span => Self::SpanUpdate(body),
            ObservationKind::Generation => Self::GenerationUpdate(body),
        }
    }
}

/// One entry of an ingestion batch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionEvent {
    pub id: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub payload: IngestionPayload,
}

impl IngestionEvent {
    pub fn new(payload: IngestionPayload) -> Self {
        Self {
            id: new_id(),
            timestamp: timestamp(Utc::now()),
            payload,
        }
    }
}

#[derive(Debug, Serialize)]
struct IngestionRequest<'a> {
    batch: &'a [IngestionEvent],
}

/// Per-event error reported by the ingestion endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct IngestionError {
    pub id: String,
    pub status: u16,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<Value>,
}

/// Response of `POST /api/public/ingestion` (HTTP 207 multi-status)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct IngestionResponse {
    #[serde(default)]
    pub successes: Vec<Value>,
    #[serde(default)]
    pub errors: Vec<IngestionError>,
}

/// HTTP client for the ingestion endpoint
pub struct LangfuseClient {
    client: reqwest::Client,
    host: String,
}

impl LangfuseClient {
    /// Create a new Langfuse client; fails without a secret key
    pub fn new(config: &ProbeConfig) -> Result<Self> {
        let credentials = Credentials::from_config(config)?;
        let client = build_http_client(&credentials, config.request_timeout)?;

        Ok(Self {
            client,
            host: config.host.clone(),
        })
    }

    /// Send events in batches of at most [`MAX_BATCH_EVENTS`]
    pub async fn ingest(&self, events: &[IngestionEvent]) -> Result<()> {
        for chunk in events.chunks(MAX_BATCH_EVENTS) {
            let response = self.send_batch(chunk).await?;

            if !response.errors.is_empty() {
                let message = response
                    .errors
                    .iter()
                    .map(|e| {
                        format!(
                            "{} ({}): {}",
                            e.id,
                            e.status,
                            e.message.as_deref().unwrap_or("unknown error")
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");

                return Err(ProbeError::Rejected {
                    rejected: response.errors.len(),
                    total: chunk.len(),
                    message,
                });
            }
        }

        Ok(())
    }

    async fn send_batch(&self, batch: &[IngestionEvent]) -> Result<IngestionResponse> {
        let url = format!("{}/api/public/ingestion", self.host);
        tracing::debug!("POST {} ({} events)", url, batch.len());

        let response = self
            .client
            .post(&url)
            .json(&IngestionRequest { batch })
            .send()
            .await
            .map_err(ProbeError::Connection)?;

        let response = check_status(response).await?;

        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(IngestionResponse::default());
        }

        serde_json::from_str(&body)
            .map_err(|e| ProbeError::Parse(format!("ingestion response: {}", e)))
    }
}

type EventBuffer = Arc<Mutex<Vec<IngestionEvent>>>;

/// A client session buffering events until flushed
pub struct LangfuseSession {
    client: LangfuseClient,
    buffer: EventBuffer,
    shut_down: bool,
}

impl LangfuseSession {
    /// Open a session against the configured host
    pub fn open(config: &ProbeConfig) -> Result<Self> {
        Ok(Self {
            client: LangfuseClient::new(config)?,
            buffer: Arc::new(Mutex::new(Vec::new())),
            shut_down: false,
        })
    }

    /// Start a root span, creating the trace that contains it
    pub fn start_span(&self, spec: SpanSpec) -> SpanHandle {
        let trace_id = new_id();
        let now = timestamp(Utc::now());

        push(
            &self.buffer,
            IngestionPayload::TraceCreate(TraceBody {
                id: trace_id.clone(),
                name: Some(spec.name.clone()),
                timestamp: Some(now),
                input: spec.input.clone(),
                output: spec.output.clone(),
                metadata: spec.metadata.clone(),
                ..Default::default()
            }),
        );

        SpanHandle::open(self.buffer.clone(), trace_id, None, spec)
    }

    /// Number of events waiting to be sent
    pub fn pending(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Snapshot of the events waiting to be sent
    pub fn pending_events(&self) -> Vec<IngestionEvent> {
        self.buffer.lock().clone()
    }

    /// Send all buffered events
    pub async fn flush(&self) -> Result<()> {
        let events: Vec<IngestionEvent> = std::mem::take(&mut *self.buffer.lock());
        if events.is_empty() {
            return Ok(());
        }

        tracing::debug!("Flushing {} Langfuse events", events.len());
        self.client.ingest(&events).await
    }

    /// Flush remaining events and close the session
    pub async fn shutdown(mut self) -> Result<()> {
        self.shut_down = true;
        self.flush().await
    }
}

impl Drop for LangfuseSession {
    fn drop(&mut self) {
        let pending = self.buffer.lock().len();
        if !self.shut_down && pending > 0 {
            tracing::warn!("Langfuse session dropped with {} unsent events", pending);
        }
    }
}

/// An open span or generation
pub struct SpanHandle {
    buffer: EventBuffer,
    trace_id: String,
    id: String,
    kind: ObservationKind,
    root: bool,
    ended: bool,
}

impl SpanHandle {
    fn open(
        buffer: EventBuffer,
        trace_id: String,
        parent_id: Option<String>,
        spec: SpanSpec,
    ) -> Self {
        let id = new_id();
        let kind = spec.kind();
        let root = parent_id.is_none();

        push(
            &buffer,
            IngestionPayload::create(
                kind,
                ObservationBody {
                    id: id.clone(),
                    trace_id: trace_id.clone(),
                    parent_observation_id: parent_id,
                    name: Some(spec.name),
                    start_time: Some(timestamp(Utc::now())),
                    model: spec.model,
                    input: spec.input,
                    output: spec.output,
                    metadata: spec.metadata,
                    ..Default::default()
                },
            ),
        );

        Self {
            buffer,
            trace_id,
            id,
            kind,
            root,
            ended: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn kind(&self) -> ObservationKind {
        self.kind
    }

    /// Open a child span or generation under this one
    pub fn start_child(&self, spec: SpanSpec) -> SpanHandle {
        SpanHandle::open(
            self.buffer.clone(),
            self.trace_id.clone(),
            Some(self.id.clone()),
            spec,
        )
    }

    /// Set attributes on the trace this span belongs to
    pub fn update_trace(&self, update: TraceUpdate) {
        push(
            &self.buffer,
            IngestionPayload::TraceCreate(TraceBody {
                id: self.trace_id.clone(),
                session_id: update.session_id,
                user_id: update.user_id,
                tags: update.tags,
                metadata: update.metadata,
                ..Default::default()
            }),
        );
    }

    /// Set the output of this span. The root span's output is also the
    /// trace's output, mirroring how its input seeds the trace.
    pub fn update_output(&self, output: impl Into<Value>) {
        let output = output.into();

        if self.root {
            push(
                &self.buffer,
                IngestionPayload::TraceCreate(TraceBody {
                    id: self.trace_id.clone(),
                    output: Some(output.clone()),
                    ..Default::default()
                }),
            );
        }

        push(
            &self.buffer,
            IngestionPayload::update(
                self.kind,
                ObservationBody {
                    id: self.id.clone(),
                    trace_id: self.trace_id.clone(),
                    output: Some(output),
                    ..Default::default()
                },
            ),
        );
    }

    /// Close the span, recording its end time
    pub fn end(mut self) {
        self.finish();
    }

    fn finish(&mut self) {
        if self.ended {
            return;
        }
        self.ended = true;

        push(
            &self.buffer,
            IngestionPayload::update(
                self.kind,
                ObservationBody {
                    id: self.id.clone(),
                    trace_id: self.trace_id.clone(),
                    end_time: Some(timestamp(Utc::now())),
                    ..Default::default()
                },
            ),
        );
    }
}

impl Drop for SpanHandle {
    fn drop(&mut self) {
        self.finish();
    }
}

fn push(buffer: &EventBuffer, payload: IngestionPayload) {
    buffer.lock().push(IngestionEvent::new(payload));
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}
