//! Fixed-interval pass loop
//!
//! One control task runs a reconciliation pass, then sleeps for the
//! configured interval, until the shutdown token is cancelled. A pass in
//! progress is never interrupted; shutdown is observed between passes and
//! during the sleep.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument, warn};

use crate::{engine::ReconciliationEngine, SyncError};

pub struct SyncLoop {
    engine: ReconciliationEngine,
    interval: Duration,
    shutdown: CancellationToken,
}

impl SyncLoop {
    pub fn new(engine: ReconciliationEngine, interval: Duration, shutdown: CancellationToken) -> Self {
        Self {
            engine,
            interval,
            shutdown,
        }
    }

    /// Runs passes until shutdown
    ///
    /// Failed transfers are logged and retried by the next pass. Any other
    /// error stops the loop and is returned.
    ///
    /// # Returns
    /// The number of passes that were attempted
    #[instrument(skip(self), fields(interval_secs = self.interval.as_secs()))]
    pub async fn run(&self) -> Result<usize, SyncError> {
        info!("Starting sync loop");
        let mut passes = 0usize;

        while !self.shutdown.is_cancelled() {
            passes += 1;
            info!(pass = passes, "Syncing...");

            match self.engine.run_pass().await {
                Ok(report) => {
                    info!(pass = passes, duration_ms = report.duration_ms, "Syncing done");
                }
                Err(e) if e.is_recoverable() => {
                    if let SyncError::TransfersFailed { failures } = &e {
                        for failure in failures {
                            warn!(
                                phase = %failure.phase,
                                path = %failure.job.remote(),
                                error = %failure.error,
                                "Transfer failed"
                            );
                        }
                    }
                    warn!(
                        pass = passes,
                        error = %e,
                        "Pass ended with failed transfers; retrying next interval"
                    );
                }
                Err(e) => {
                    error!(pass = passes, error = %e, "Pass failed");
                    return Err(e);
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = self.shutdown.cancelled() => {
                    info!("Shutdown signal received");
                }
            }
        }

        info!(passes, "Sync loop stopped");
        Ok(passes)
    }
}
