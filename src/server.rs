//! Server startup, shutdown, and worker spawning logic.
//!
//! `run_server` builds the shortener service, wires the background worker
//! and its quarantine ticker, creates the router and serves it until a
//! shutdown signal arrives.

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::jobs::{create_job_channel, spawn_release_ticker, JobSender, Worker};
use crate::routes;
use crate::services::{ShortenerService, ShortenerSettings};
use crate::state::AppState;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info};

/// Build the shared application state, the quarantine worker and the sender
/// that feeds it.
pub fn build_state(config: &Config) -> (Arc<AppState>, Worker, JobSender) {
    let shortener = ShortenerService::new(ShortenerSettings::from(&config.url));

    let (job_sender, job_receiver) = create_job_channel();
    let worker = Worker::new(shortener.clone(), job_receiver);

    let state = Arc::new(AppState::new(shortener, config.url.base_url.clone()));

    (state, worker, job_sender)
}

/// Run the web server with the given configuration.
///
/// # Arguments
///
/// * `config` - The application configuration
/// * `addr` - The address to bind the server to (e.g., "127.0.0.1:3001")
///
/// # Errors
///
/// Returns an error if the router cannot be built, the address cannot be
/// bound, or the server fails while running.
pub async fn run_server(config: Config, addr: String) -> AppResult<()> {
    info!("Starting snaplink server...");

    let (state, worker, job_sender) = build_state(&config);
    let worker_handle = tokio::spawn(worker.run());
    let ticker_handle = spawn_release_ticker(
        job_sender,
        Duration::from_secs(config.url.release_sweep_interval_seconds),
    );

    info!(
        code_length = config.url.short_code_length,
        max_attempts = config.url.short_code_max_attempts,
        release_delay_seconds = config.url.code_release_delay_seconds,
        "Shortener ready"
    );

    let app = routes::create_router(state, config.cors.allowed_origins, config.rate_limit)?;

    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to bind to address {}: {}", addr, e)))?;

    info!("Server listening on {}", addr);
    info!("Base URL: {}", config.url.base_url);

    axum::serve(listener, app)
        .with_graceful_shutdown(create_shutdown_signal())
        .await
        .map_err(|e| AppError::Internal(format!("Server error: {}", e)))?;

    // The ticker owns the last job sender; the worker exits once it is gone
    ticker_handle.abort();
    let _ = ticker_handle.await;

    if let Err(e) = worker_handle.await {
        error!("Worker task failed: {:?}", e);
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Resolves when Ctrl+C (or SIGTERM on Unix) is received.
///
/// # Panics
///
/// Panics if a signal handler cannot be installed; without one graceful
/// shutdown is impossible.
async fn create_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    #[cfg(not(unix))]
    ctrl_c.await;

    info!("Shutdown signal received");
}
