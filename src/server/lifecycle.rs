use crate::protocol::{PeerId, ProtocolError};
use crate::registry::RegisterError;
use axum::extract::ws::{close_code, CloseFrame};
use std::fmt;

/// Per-connection states. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Established,
    Closing,
    Closed,
}

impl ConnectionState {
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Connecting, Self::Established)
                | (Self::Connecting, Self::Closing)
                | (Self::Established, Self::Closing)
                | (Self::Closing, Self::Closed)
        )
    }
}

/// Why a connection left the `Established` state (or never reached it).
#[derive(Debug)]
pub enum CloseReason {
    /// Client sent a close frame.
    ClientClosed,
    /// Stream ended without a close frame.
    Disconnected,
    /// Receive failed at the transport layer.
    Transport(String),
    /// Frame violated the relay protocol.
    Protocol(ProtocolError),
    /// Registration refused under the duplicate policy.
    Rejected(RegisterError),
    /// Another connection took over this peer id.
    Superseded,
    /// Writing to the client failed.
    OutboundFailed,
    /// Nothing arrived (not even a pong) within the keepalive window.
    Timeout,
}

impl CloseReason {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::ClientClosed => "client_closed",
            Self::Disconnected => "disconnected",
            Self::Transport(_) => "transport_error",
            Self::Protocol(err) => err.kind(),
            Self::Rejected(_) => "duplicate_peer",
            Self::Superseded => "superseded",
            Self::OutboundFailed => "outbound_failed",
            Self::Timeout => "keepalive_timeout",
        }
    }

    pub const fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::Protocol(_))
    }

    /// Close frame the relay sends before dropping the socket, if any.
    ///
    /// `None` when the client already closed or the transport is gone.
    pub fn close_frame(&self) -> Option<CloseFrame> {
        let code = match self {
            Self::ClientClosed | Self::Disconnected | Self::Transport(_) => return None,
            Self::Protocol(ProtocolError::IdentityMismatch { .. }) => close_code::POLICY,
            Self::Protocol(_) => close_code::PROTOCOL,
            Self::Rejected(_) | Self::Superseded => close_code::POLICY,
            Self::OutboundFailed | Self::Timeout => close_code::ERROR,
        };
        Some(CloseFrame {
            code,
            reason: self.label().into(),
        })
    }
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(detail) => write!(f, "transport error: {detail}"),
            Self::Protocol(err) => write!(f, "protocol violation: {err}"),
            Self::Rejected(err) => write!(f, "rejected: {err}"),
            other => f.write_str(other.label()),
        }
    }
}

/// State tracker for one connection, logging every transition.
#[derive(Debug)]
pub struct ConnectionLifecycle {
    peer_id: PeerId,
    state: ConnectionState,
}

impl ConnectionLifecycle {
    pub fn new(peer_id: PeerId) -> Self {
        Self {
            peer_id,
            state: ConnectionState::Connecting,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    /// Move to `next`; out-of-order transitions are logged and ignored.
    pub fn advance(&mut self, next: ConnectionState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                peer_id = %self.peer_id,
                from = ?self.state,
                to = ?next,
                "Ignoring invalid connection state transition"
            );
            return false;
        }
        tracing::debug!(
            peer_id = %self.peer_id,
            from = ?self.state,
            to = ?next,
            "Connection state changed"
        );
        self.state = next;
        true
    }
}
