use crate::protocol::PeerId;
use crate::server::RelayServer;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{ConnectInfo, Path, State};
use axum::response::Response;
use std::net::SocketAddr;
use std::sync::Arc;

use super::connection::handle_socket;

/// WebSocket handler for `/websocket/{peer_id}`.
///
/// A path segment that does not parse as a [`PeerId`] is rejected by the
/// `Path` extractor with `400 Bad Request` before any upgrade happens.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Path(peer_id): Path<PeerId>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(server): State<Arc<RelayServer>>,
) -> Response {
    let max_message_size = server.config().max_message_size;
    tracing::debug!(%peer_id, client_addr = %addr, "WebSocket upgrade requested");

    ws.max_message_size(max_message_size)
        .max_frame_size(max_message_size)
        .on_failed_upgrade(move |err| {
            tracing::warn!(%peer_id, client_addr = %addr, error = %err, "WebSocket upgrade failed");
        })
        .on_upgrade(move |socket| handle_socket(socket, server, peer_id, addr))
}
