use crate::scheduler::TokioScheduler;
use anyhow::Result;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Graceful shutdown coordinator.
///
/// Scheduled work cannot be cancelled, so shutdown waits for whatever is still
/// in flight instead. Runs whose work is abandoned keep their last state.
pub struct ShutdownCoordinator {
    drain_timeout: Duration,
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl ShutdownCoordinator {
    pub fn new(drain_timeout: Duration) -> Self {
        Self { drain_timeout }
    }

    /// Wait for in-flight scheduled work, up to the drain timeout
    pub async fn drain(&self, scheduler: &TokioScheduler) -> Result<()> {
        let outstanding = scheduler.in_flight();
        if outstanding == 0 {
            info!("No scheduled work in flight");
            return Ok(());
        }

        info!(outstanding, "Waiting for scheduled work to finish...");
        timeout(self.drain_timeout, async {
            while scheduler.in_flight() > 0 {
                tokio::time::sleep(DRAIN_POLL_INTERVAL).await;
            }
        })
        .await
        .map_err(|_| {
            warn!(
                remaining = scheduler.in_flight(),
                "Scheduled work still running at shutdown"
            );
            anyhow::anyhow!(
                "Timeout waiting for {} scheduled task(s) to finish",
                scheduler.in_flight()
            )
        })?;

        info!("Scheduled work drained");
        Ok(())
    }

    /// Drain and log final statistics
    pub async fn shutdown(&self, scheduler: &TokioScheduler) -> Result<()> {
        info!("Initiating graceful shutdown...");
        let drained = self.drain(scheduler).await;
        scheduler.metrics().log_stats();
        drained?;
        info!("Graceful shutdown completed successfully");
        Ok(())
    }
}
