//! metrica agent.
//!
//! Config path from argv[1] (default `metrica-agent.yaml`); runs until
//! Ctrl-C, then stops both loops.

use std::process::ExitCode;
use std::sync::Arc;

use tracing_subscriber::{fmt, EnvFilter};

use metrica_agent::controller::{Controller, ControllerConfig};
use metrica_agent::sampler::Sampler;
use metrica_agent::{config, transport::HttpTransport};
use metrica_core::error::{MetricaError, Result};

const DEFAULT_CONFIG_PATH: &str = "metrica-agent.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "metrica-agent failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;

    let transport = HttpTransport::from_config(&cfg.agent)?;
    tracing::info!(url = transport.url(), "metrica-agent starting");

    let handle = Controller::start(
        ControllerConfig {
            poll_interval: cfg.agent.poll_interval(),
            report_interval: cfg.agent.report_interval(),
        },
        Sampler::new(),
        Arc::new(transport),
    );

    let signal = tokio::signal::ctrl_c()
        .await
        .map_err(|e| MetricaError::Internal(format!("ctrl-c handler failed: {e}")));

    handle.stop().await;
    signal
}
