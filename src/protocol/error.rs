use thiserror::Error;

use super::types::PeerId;

/// Protocol violations detected while processing an inbound frame.
///
/// Every variant is fatal for the offending connection only: the relay closes
/// that socket and keeps serving everyone else.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed routing envelope: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("envelope claims sender {claimed} but the connection is bound to {bound}")]
    IdentityMismatch { bound: PeerId, claimed: PeerId },

    #[error("unsupported {0} frame")]
    UnsupportedFrame(&'static str),
}

impl ProtocolError {
    /// Short machine-friendly label used in logs and close reasons.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Decode(_) => "decode",
            Self::IdentityMismatch { .. } => "identity_mismatch",
            Self::UnsupportedFrame(_) => "unsupported_frame",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_mismatch_message_names_both_ids() {
        let err = ProtocolError::IdentityMismatch {
            bound: 1,
            claimed: 2,
        };
        let rendered = err.to_string();
        assert!(rendered.contains("sender 2"));
        assert!(rendered.contains("bound to 1"));
        assert_eq!(err.kind(), "identity_mismatch");
    }

    #[test]
    fn decode_errors_wrap_serde() {
        let serde_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ProtocolError::from(serde_err);
        assert_eq!(err.kind(), "decode");
        assert!(err.to_string().starts_with("malformed routing envelope"));
    }
}
