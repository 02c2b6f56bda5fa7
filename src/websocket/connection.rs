use crate::protocol::PeerId;
use crate::registry::PeerRegistration;
use crate::server::{CloseReason, ConnectionLifecycle, ConnectionState, RelayServer};
use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Upper bound on flushing the close handshake to an unresponsive client.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

type WsSink = SplitSink<WebSocket, Message>;

pub(super) async fn handle_socket(
    socket: WebSocket,
    server: Arc<RelayServer>,
    peer_id: PeerId,
    addr: SocketAddr,
) {
    let mut lifecycle = ConnectionLifecycle::new(peer_id);
    let (mut sink, mut stream) = socket.split();
    let (tx, rx) = mpsc::channel::<Message>(server.config().outbound_queue_capacity);

    let registration = match server.register_peer(peer_id, tx) {
        Ok(registration) => registration,
        Err(err) => {
            let reason = CloseReason::Rejected(err);
            lifecycle.advance(ConnectionState::Closing);
            close_sink(&mut sink, &reason, peer_id).await;
            lifecycle.advance(ConnectionState::Closed);
            tracing::warn!(%peer_id, client_addr = %addr, %reason, "WebSocket connection refused");
            return;
        }
    };
    lifecycle.advance(ConnectionState::Established);
    tracing::info!(
        %peer_id,
        client_addr = %addr,
        connection_id = %registration.connection_id(),
        "WebSocket connection established"
    );

    let close_signal = registration.handle().close_signal().clone();
    let writer = tokio::spawn(write_outbound(
        sink,
        rx,
        close_signal.clone(),
        server.config().ping_interval,
        peer_id,
    ));

    let reason = receive_loop(&server, &registration, &mut stream, &close_signal).await;

    // Registry entry goes first, then the socket.
    lifecycle.advance(ConnectionState::Closing);
    server.release_peer(registration, &reason);
    close_signal.cancel();

    match writer.await {
        Ok(mut sink) => close_sink(&mut sink, &reason, peer_id).await,
        Err(err) => {
            tracing::error!(%peer_id, error = %err, "Outbound writer task failed");
        }
    }
    lifecycle.advance(ConnectionState::Closed);

    if reason.is_protocol_violation() {
        tracing::warn!(%peer_id, client_addr = %addr, %reason, "WebSocket connection closed");
    } else {
        tracing::info!(%peer_id, client_addr = %addr, %reason, "WebSocket connection closed");
    }
}

/// Read frames until the connection must close, relaying each data frame.
///
/// Any inbound frame, pongs included, proves the peer is alive; silence longer
/// than the configured idle limit ends the connection.
async fn receive_loop(
    server: &RelayServer,
    registration: &PeerRegistration,
    stream: &mut SplitStream<WebSocket>,
    close_signal: &CancellationToken,
) -> CloseReason {
    let peer_id = registration.peer_id();
    let idle_limit = server.config().idle_limit();
    let mut deadline = Instant::now() + idle_limit;

    loop {
        let next = tokio::select! {
            biased;
            () = close_signal.cancelled() => {
                return if registration.is_current() {
                    CloseReason::OutboundFailed
                } else {
                    CloseReason::Superseded
                };
            }
            () = tokio::time::sleep_until(deadline) => {
                tracing::info!(
                    %peer_id,
                    idle_secs = idle_limit.as_secs_f64(),
                    "Peer stopped answering keepalive pings"
                );
                return CloseReason::Timeout;
            }
            next = stream.next() => next,
        };

        let frame = match next {
            None => return CloseReason::Disconnected,
            Some(Err(err)) => {
                tracing::warn!(%peer_id, error = %err, "WebSocket error");
                return CloseReason::Transport(err.to_string());
            }
            Some(Ok(frame)) => frame,
        };
        deadline = Instant::now() + idle_limit;

        match frame {
            Message::Close(_) => return CloseReason::ClientClosed,
            // Pings are answered by the transport.
            Message::Ping(_) | Message::Pong(_) => {}
            frame => {
                if let Err(err) = server.route_frame(peer_id, frame) {
                    tracing::warn!(
                        %peer_id,
                        error = %err,
                        "Rejected client WebSocket frame"
                    );
                    return CloseReason::Protocol(err);
                }
            }
        }
    }
}

/// Drain the outbound queue into the socket until asked to stop, pinging the
/// peer every `ping_interval`.
///
/// A write failure cancels `close_signal` so the receive loop ends too.
async fn write_outbound(
    mut sink: WsSink,
    mut outbound: mpsc::Receiver<Message>,
    close_signal: CancellationToken,
    ping_interval: Duration,
    peer_id: PeerId,
) -> WsSink {
    let mut keepalive = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
    keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let frame = tokio::select! {
            biased;
            () = close_signal.cancelled() => break,
            frame = outbound.recv() => match frame {
                Some(frame) => frame,
                None => break,
            },
            _ = keepalive.tick() => {
                tracing::trace!(%peer_id, "Sending keepalive ping");
                Message::Ping(Bytes::new())
            }
        };

        let written = tokio::select! {
            biased;
            () = close_signal.cancelled() => break,
            written = sink.send(frame) => written,
        };

        if let Err(err) = written {
            tracing::warn!(%peer_id, error = %err, "Failed to send message, connection closed");
            close_signal.cancel();
            break;
        }
    }

    sink
}

async fn close_sink(sink: &mut WsSink, reason: &CloseReason, peer_id: PeerId) {
    let closing = async {
        if let Some(frame) = reason.close_frame() {
            if let Err(err) = sink.send(Message::Close(Some(frame))).await {
                tracing::debug!(%peer_id, error = %err, "Failed to send close frame");
            }
        }
        let _ = sink.close().await;
    };

    if tokio::time::timeout(CLOSE_TIMEOUT, closing).await.is_err() {
        tracing::debug!(%peer_id, "Timed out closing WebSocket");
    }
}
