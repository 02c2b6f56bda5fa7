//! Relay behaviour configuration.

use super::defaults::{
    default_duplicate_policy, default_max_message_size, default_outbound_queue_capacity,
    default_ping_interval_secs, default_ping_timeout_secs, default_shutdown_grace_secs,
    default_status_interval_secs,
};
use crate::registry::DuplicatePolicy;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RelayConfig {
    /// Interval between status lines (seconds)
    #[serde(default = "default_status_interval_secs")]
    pub status_interval_secs: u64,
    /// What to do when a second connection claims a live peer id
    #[serde(default = "default_duplicate_policy")]
    pub duplicate_policy: DuplicatePolicy,
    /// Maximum WebSocket message size in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Frames buffered per connection before new ones are dropped
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
    /// Interval between keepalive pings sent to each peer (seconds)
    #[serde(default = "default_ping_interval_secs")]
    pub ping_interval_secs: u64,
    /// Silence tolerated after a ping before the peer is dropped (seconds)
    #[serde(default = "default_ping_timeout_secs")]
    pub ping_timeout_secs: u64,
    /// Time live connections get after an interrupt before the process exits (seconds)
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            status_interval_secs: default_status_interval_secs(),
            duplicate_policy: default_duplicate_policy(),
            max_message_size: default_max_message_size(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
            ping_interval_secs: default_ping_interval_secs(),
            ping_timeout_secs: default_ping_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}
