use std::sync::Arc;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant, interval_at};
use tracing::{debug, info};

use crate::rate_limit::RateLimitRegistry;

// Handle to the background sweeper task
pub struct SweeperHandle {
    stop_tx: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

impl SweeperHandle {
    // Signal the loop to exit and wait for it
    pub async fn stop(self) {
        let _ = self.stop_tx.send(());
        let _ = self.task.await;
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

// Evicts idle limiters every `period` - first pass one full period after start
pub fn spawn_sweeper(registry: Arc<RateLimitRegistry>, period: Duration) -> SweeperHandle {
    let (stop_tx, mut stop_rx) = oneshot::channel::<()>();

    let task = tokio::spawn(async move {
        let mut ticker = interval_at(Instant::now() + period, period);
        info!(interval = ?period, "Sweeper started");

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let removed = registry.sweep();
                    if removed > 0 {
                        info!(removed, remaining = registry.len(), "Evicted idle clients");
                    } else {
                        debug!(remaining = registry.len(), "Sweep found nothing stale");
                    }
                }
                // stop signal, or the handle was dropped
                _ = &mut stop_rx => break,
            }
        }

        info!("Sweeper stopped");
    });

    SweeperHandle { stop_tx, task }
}
