use crate::metrics::RelayMetrics;
use crate::protocol::PeerId;
use crate::registry::{
    DuplicatePolicy, PeerHandle, PeerRegistration, PeerRegistry, RegisterError,
};
use axum::extract::ws::Message;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::Duration;

mod lifecycle;
mod routing;
mod shutdown;
mod status;

pub use lifecycle::{CloseReason, ConnectionLifecycle, ConnectionState};
pub use routing::RouteOutcome;
pub use shutdown::{listen_for_interrupt, ShutdownFlag};

/// Relay core: the peer registry plus everything connection tasks share.
pub struct RelayServer {
    /// Who is currently reachable
    registry: Arc<PeerRegistry>,
    /// Relay behaviour configuration
    config: RelayServerConfig,
    /// Relay metrics
    metrics: Arc<RelayMetrics>,
    /// Process-wide shutdown flag polled by the status reporter
    shutdown: ShutdownFlag,
}

#[derive(Debug, Clone)]
pub struct RelayServerConfig {
    /// How often the status reporter logs the registry snapshot.
    pub status_interval: Duration,
    /// Policy for a connection claiming an id that is already live.
    pub duplicate_policy: DuplicatePolicy,
    /// Largest inbound frame accepted by the transport, in bytes.
    pub max_message_size: usize,
    /// Frames that may wait in one connection's outbound queue.
    pub outbound_queue_capacity: usize,
    /// How often each connection is pinged.
    pub ping_interval: Duration,
    /// Extra silence tolerated after a ping before the peer counts as dead.
    pub ping_timeout: Duration,
}

impl RelayServerConfig {
    /// Longest a connection may stay silent before it is dropped.
    pub fn idle_limit(&self) -> Duration {
        self.ping_interval + self.ping_timeout
    }
}

impl Default for RelayServerConfig {
    fn default() -> Self {
        Self {
            status_interval: Duration::from_secs(2),
            duplicate_policy: DuplicatePolicy::RejectNew,
            max_message_size: 65536, // 64KB
            outbound_queue_capacity: 64,
            ping_interval: Duration::from_secs(20),
            ping_timeout: Duration::from_secs(20),
        }
    }
}

impl From<&crate::config::RelayConfig> for RelayServerConfig {
    fn from(cfg: &crate::config::RelayConfig) -> Self {
        Self {
            status_interval: Duration::from_secs(cfg.status_interval_secs.max(1)),
            duplicate_policy: cfg.duplicate_policy,
            max_message_size: cfg.max_message_size,
            outbound_queue_capacity: cfg.outbound_queue_capacity.max(1),
            ping_interval: Duration::from_secs(cfg.ping_interval_secs.max(1)),
            ping_timeout: Duration::from_secs(cfg.ping_timeout_secs.max(1)),
        }
    }
}

impl RelayServer {
    pub fn new(config: RelayServerConfig, shutdown: ShutdownFlag) -> Arc<Self> {
        let registry = Arc::new(PeerRegistry::new(config.duplicate_policy));
        Arc::new(Self {
            registry,
            config,
            metrics: Arc::new(RelayMetrics::new()),
            shutdown,
        })
    }

    pub fn config(&self) -> &RelayServerConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<PeerRegistry> {
        &self.registry
    }

    pub fn metrics(&self) -> &Arc<RelayMetrics> {
        &self.metrics
    }

    pub fn shutdown_flag(&self) -> &ShutdownFlag {
        &self.shutdown
    }

    /// Healthy until shutdown has been requested.
    pub fn health_check(&self) -> bool {
        !self.shutdown.is_triggered()
    }

    /// Bind `peer_id` to a new connection whose outbound frames go to `outbound`.
    ///
    /// The returned guard keeps the registry entry alive; hand it back to
    /// [`RelayServer::release_peer`] (or drop it) when the connection ends.
    pub fn register_peer(
        &self,
        peer_id: PeerId,
        outbound: mpsc::Sender<Message>,
    ) -> Result<PeerRegistration, RegisterError> {
        let handle = PeerHandle::new(peer_id, outbound);
        match PeerRegistration::acquire(&self.registry, handle) {
            Ok((registration, evicted)) => {
                if let Some(evicted) = evicted {
                    self.metrics.increment_evictions();
                    tracing::info!(
                        %peer_id,
                        evicted_connection = %evicted.connection_id(),
                        "Existing connection superseded by new connection"
                    );
                }
                self.metrics.increment_connections();
                tracing::info!(
                    %peer_id,
                    connection_id = %registration.connection_id(),
                    "Peer registered"
                );
                Ok(registration)
            }
            Err(err) => {
                self.metrics.increment_rejections();
                tracing::warn!(%peer_id, error = %err, "Peer registration rejected");
                Err(err)
            }
        }
    }

    /// Remove the peer's registry entry. Consumes the guard so the entry is gone
    /// before the caller closes the socket.
    pub fn release_peer(&self, registration: PeerRegistration, reason: &CloseReason) {
        let peer_id = registration.peer_id();
        let connection_id = registration.connection_id();
        drop(registration);
        self.metrics.increment_disconnections();
        tracing::info!(
            %peer_id,
            %connection_id,
            reason = %reason,
            "Peer unregistered"
        );
    }
}
