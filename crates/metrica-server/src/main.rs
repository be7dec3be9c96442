//! metrica collector.
//!
//! - config path from argv[1] (default `metrica-server.yaml`)
//! - storage backend + envelope decoder built once at startup
//! - Ctrl-C: stop accepting, drain in-flight requests, then flush storage

use std::net::SocketAddr;
use std::process::ExitCode;

use tracing_subscriber::{fmt, EnvFilter};

use metrica_core::error::{MetricaError, Result};
use metrica_server::storage::Storage;
use metrica_server::{app_state, config, router};

const DEFAULT_CONFIG_PATH: &str = "metrica-server.yaml";

#[tokio::main]
async fn main() -> ExitCode {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "metrica-server failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
    let cfg = config::load_from_file(&path)?;

    let listen: SocketAddr = cfg.server.listen.parse().map_err(|e| {
        MetricaError::Config(format!("server.listen must be a valid SocketAddr: {e}"))
    })?;

    let state = app_state::AppState::new(cfg).await?;
    let storage = state.storage();
    let app = router::build_router(state);

    tracing::info!(%listen, backend = storage.name(), "metrica-server starting");
    let listener = tokio::net::TcpListener::bind(listen)
        .await
        .map_err(|e| MetricaError::Config(format!("bind {listen} failed: {e}")))?;

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| MetricaError::Internal(format!("server failed: {e}")));

    // flush even when serving failed
    let stopped = storage.stop().await;
    tracing::info!("metrica-server stopped");

    served.and(stopped)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "ctrl-c handler failed, running until killed");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
