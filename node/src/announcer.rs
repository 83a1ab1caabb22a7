//! Periodic election announcement driver.
//!
//! Runs the announcement sweep on the configured interval until shutdown.
//! The interval is short on test networks (milliseconds) and tens of
//! seconds in production.

use ember_consensus::ActiveTransactions;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Spawn the announcement loop on the current tokio runtime.
pub fn spawn_announcer(
    active: Arc<ActiveTransactions>,
    interval_ms: u64,
    mut shutdown: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(interval_ms.max(1)));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = interval.tick() => active.announce_votes(),
                _ = shutdown.recv() => {
                    tracing::debug!("announcer stopping");
                    break;
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shutdown::ShutdownController;
    use ember_consensus::ActiveTransactions;
    use ember_types::ConsensusParams;

    #[tokio::test]
    async fn announcer_stops_on_shutdown() {
        let active = Arc::new(ActiveTransactions::new(
            ConsensusParams::test(),
            Box::new(|_| {}),
        ));
        let controller = ShutdownController::new();
        let handle = spawn_announcer(Arc::clone(&active), 1, controller.subscribe());

        tokio::time::sleep(Duration::from_millis(20)).await;
        controller.shutdown();
        handle.await.unwrap();
    }
}
