use super::RelayServer;
use crate::protocol::{PeerId, ProtocolError, RoutingEnvelope};
use crate::registry::DeliveryError;
use axum::extract::ws::Message;

/// Result of routing one valid envelope. None of these are errors for the sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    /// Frame queued on the destination's connection.
    Forwarded { to: PeerId },
    /// No live connection for the destination; frame dropped.
    Unroutable { to: PeerId },
    /// Destination's outbound queue was full; frame dropped.
    Dropped { to: PeerId },
}

impl RelayServer {
    /// Validate one inbound data frame from the connection bound to `bound` and
    /// relay it unchanged to the envelope's destination.
    ///
    /// An `Err` is a protocol violation and the caller must close the sender's
    /// connection. Delivery problems are reported through [`RouteOutcome`].
    pub fn route_frame(&self, bound: PeerId, frame: Message) -> Result<RouteOutcome, ProtocolError> {
        self.metrics.increment_frames_received();

        let envelope = match RoutingEnvelope::from_frame(&frame)
            .and_then(|envelope| envelope.verify_sender(bound).map(|()| envelope))
        {
            Ok(envelope) => envelope,
            Err(err) => {
                self.metrics.increment_protocol_violations();
                return Err(err);
            }
        };

        let to = envelope.to_user_id;
        let Some(destination) = self.registry.lookup(to) else {
            self.metrics.increment_frames_unroutable();
            tracing::info!(from = %bound, %to, "Destination peer not found, dropping message");
            return Ok(RouteOutcome::Unroutable { to });
        };

        match destination.try_deliver(frame) {
            Ok(()) => {
                self.metrics.increment_frames_forwarded();
                tracing::trace!(from = %bound, %to, "Relayed frame");
                Ok(RouteOutcome::Forwarded { to })
            }
            Err(DeliveryError::QueueFull(_)) => {
                self.metrics.increment_frames_dropped_backpressure();
                tracing::warn!(
                    from = %bound,
                    %to,
                    capacity = self.config.outbound_queue_capacity,
                    "Destination outbound queue full, dropping message"
                );
                Ok(RouteOutcome::Dropped { to })
            }
            Err(DeliveryError::Closed(_)) => {
                self.metrics.increment_frames_unroutable();
                tracing::debug!(from = %bound, %to, "Destination is closing, dropping message");
                Ok(RouteOutcome::Unroutable { to })
            }
        }
    }
}
