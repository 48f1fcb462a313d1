//! Server Module
//!
//! Runs the HTTP API and the periodic sweep until a shutdown signal arrives.

use std::net::SocketAddr;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::api::{create_router, AppState};
use crate::config::Config;
use crate::tasks::spawn_sweep_task;
use crate::transient::Transients;

/// Serves `transients` over HTTP on `config.server_port`.
///
/// # Startup Sequence
/// 1. Wrap the stores in shared application state
/// 2. Start the background sweep task
/// 3. Create Axum router with all endpoints
/// 4. Start HTTP server on configured port
/// 5. Handle graceful shutdown on SIGINT/SIGTERM
pub async fn serve(config: &Config, transients: Transients) -> Result<()> {
    let state = AppState::new(transients);

    let sweep_handle = spawn_sweep_task(state.transients.clone(), config.sweep_interval);
    info!("Background sweep task started");

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(sweep_handle))
        .await
        .context("server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the sweep task and allows graceful shutdown.
async fn shutdown_signal(sweep_handle: JoinHandle<()>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    sweep_handle.abort();
    warn!("Sweep task aborted");
}
