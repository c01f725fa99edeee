//! Langfuse probe
//!
//! End-to-end checks against a running Langfuse instance: connectivity,
//! trace ingestion and trace queries, with a human-readable report.

pub mod api;
pub mod checks;
pub mod config;
pub mod error;
pub mod integrations;
pub mod runner;

pub use checks::{CheckReport, Outcome};
pub use config::ProbeConfig;
pub use error::{ProbeError, Result};
pub use runner::{run_probe, ProbeSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
