use uuid::Uuid;

/// Identifier a client claims in its connection path (`/websocket/{id}`).
///
/// Not validated against any identity source; it names a logical peer for the
/// lifetime of one connection.
pub type PeerId = i64;

/// Server-assigned identity of one physical WebSocket connection.
///
/// Two connections may claim the same [`PeerId`] over time (or at once, under
/// the evicting duplicate policy); the connection id tells them apart so that a
/// stale connection can never deregister its successor.
pub type ConnectionId = Uuid;
