use super::RelayServer;
use crate::registry::RegistrySnapshot;
use tokio::time::MissedTickBehavior;

impl RelayServer {
    /// Log the current registry snapshot once.
    pub fn report_status(&self) -> RegistrySnapshot {
        let snapshot = self.registry.snapshot();
        tracing::info!(online = snapshot.count, peers = %snapshot, "Relay status");
        snapshot
    }

    /// Periodic status reporter.
    ///
    /// Reads the registry only; returns on the first tick after the shutdown
    /// flag is set.
    pub async fn status_task(&self) {
        let mut interval = tokio::time::interval(self.config.status_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;

            if self.shutdown.is_triggered() {
                tracing::info!("Status reporter stopping");
                break;
            }

            self.report_status();
        }
    }
}
