//! Transient Sweep Task
//!
//! Background task that periodically sweeps expired transients.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::transient::Transients;

/// Spawns a background task that periodically sweeps both transient scopes.
///
/// The first sweep runs one full interval after start-up. Reclamation itself
/// goes through each scope's lazy expiry, so the task holds no locks of its
/// own and may overlap with live traffic. Each sweep runs on the blocking pool.
///
/// # Arguments
/// * `transients` - Shared transient stores
/// * `sweep_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let transients = Arc::new(Transients::builder(Arc::new(MemoryOptions::new())).build());
/// let sweep_handle = spawn_sweep_task(transients.clone(), 300);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(transients: Arc<Transients>, sweep_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(sweep_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting transient sweep task with interval of {} seconds",
            sweep_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            // Durable substrates write to disk under their table lock.
            let sweeping = transients.clone();
            match tokio::task::spawn_blocking(move || sweeping.sweep()).await {
                Ok(Some(report)) if report.reclaimed() > 0 => {
                    info!(
                        "Transient sweep: reclaimed {} expired transients",
                        report.reclaimed()
                    );
                }
                Ok(Some(_)) => debug!("Transient sweep: nothing to reclaim"),
                Ok(None) => debug!("Transient sweep: skipped"),
                Err(e) => warn!("Transient sweep task failed: {e}"),
            }
        }
    })
}
