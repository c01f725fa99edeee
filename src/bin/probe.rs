//! Langfuse probe CLI
//!
//! Runs the connectivity, trace creation and query checks and exits with 0
//! when all of them passed.

use std::io;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use langfuse_probe::config::ProbeConfig;
use langfuse_probe::run_probe;

#[derive(Parser)]
#[command(name = "langfuse-probe")]
#[command(about = "Check connectivity and trace ingestion of a Langfuse instance")]
#[command(version)]
struct Args {
    /// Langfuse base URL [default: $LANGFUSE_HOST or http://localhost:3150]
    #[arg(long)]
    host: Option<String>,

    /// Langfuse public key [default: $LANGFUSE_PUBLIC_KEY]
    #[arg(long)]
    public_key: Option<String>,

    /// Langfuse secret key [default: $LANGFUSE_SECRET_KEY]
    #[arg(long)]
    secret_key: Option<String>,

    /// Seconds to wait for ingestion before querying traces
    #[arg(long, default_value = "2")]
    settle_secs: u64,

    /// Number of traces to request in the query check
    #[arg(long, default_value = "5")]
    limit: u32,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

impl Args {
    /// Environment first, explicit flags on top
    fn into_config(self) -> ProbeConfig {
        let mut config = ProbeConfig::from_env();

        if let Some(host) = self.host {
            config = config.with_host(host);
        }
        if let Some(public_key) = self.public_key {
            config.public_key = public_key;
        }
        if let Some(secret_key) = self.secret_key.filter(|s| !s.trim().is_empty()) {
            config = config.with_secret_key(secret_key);
        }

        ProbeConfig {
            settle_delay: Duration::from_secs(self.settle_secs),
            query_limit: self.limit,
            ..config
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Logs go to stderr; stdout carries the report
    tracing_subscriber::registry()
        .with(args.log_json.then(|| {
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
        }))
        .with((!args.log_json).then(|| {
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
        }))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = args.into_config();
    tracing::debug!("Probe config: {:?}", config);

    let mut stdout = io::stdout().lock();
    match run_probe(&config, &mut stdout).await {
        Ok(summary) => ExitCode::from(summary.exit_code()),
        Err(e) => {
            tracing::error!("Failed to write report: {}", e);
            ExitCode::FAILURE
        }
    }
}
