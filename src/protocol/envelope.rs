use axum::extract::ws::Message;
use serde::de::IgnoredAny;
use serde::Deserialize;

use super::error::ProtocolError;
use super::types::PeerId;

/// Routing header decoded from a client frame.
///
/// Wire shape: `{"userId": <int>, "toUserId": <int>, "message": {...}}`.
/// The `message` member must be present but is skipped without being
/// materialised; the relay forwards the original frame, never a re-encoding.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoutingEnvelope {
    /// Sender identifier; must match the id bound to the connection.
    pub user_id: PeerId,
    /// Destination identifier.
    pub to_user_id: PeerId,
    #[serde(rename = "message")]
    _message: IgnoredAny,
}

impl RoutingEnvelope {
    pub fn from_text(text: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode the routing header of a data frame.
    ///
    /// Text and binary frames both carry JSON; control frames are not envelopes.
    pub fn from_frame(frame: &Message) -> Result<Self, ProtocolError> {
        match frame {
            Message::Text(text) => Self::from_text(text.as_str()),
            Message::Binary(bytes) => Self::from_slice(bytes),
            Message::Ping(_) => Err(ProtocolError::UnsupportedFrame("ping")),
            Message::Pong(_) => Err(ProtocolError::UnsupportedFrame("pong")),
            Message::Close(_) => Err(ProtocolError::UnsupportedFrame("close")),
        }
    }

    /// Reject envelopes whose sender differs from the connection's bound id.
    pub fn verify_sender(&self, bound: PeerId) -> Result<(), ProtocolError> {
        if self.user_id == bound {
            Ok(())
        } else {
            Err(ProtocolError::IdentityMismatch {
                bound,
                claimed: self.user_id,
            })
        }
    }
}
