//! External integrations module
//!
//! Currently supported:
//! - Langfuse ingestion (feature-gated behind `langfuse` feature)

#[cfg(feature = "langfuse")]
pub mod langfuse;

#[cfg(feature = "langfuse")]
pub use langfuse::{
    IngestionEvent, IngestionPayload, LangfuseClient, LangfuseSession, ObservationKind, SpanHandle,
    SpanSpec, TraceUpdate,
};
