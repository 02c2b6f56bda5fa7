// Protocol module: identifiers, the routing envelope, and protocol errors

pub mod envelope;
pub mod error;
pub mod types;

pub use envelope::RoutingEnvelope;
pub use error::ProtocolError;
pub use types::{ConnectionId, PeerId};
