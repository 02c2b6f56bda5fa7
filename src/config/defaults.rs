//! Default value functions for configuration fields.
//!
//! These back the `#[serde(default = ...)]` attributes across the configuration
//! types, grouped by section.

use super::logging::LogFormat;
use crate::registry::DuplicatePolicy;

// =============================================================================
// Listener
// =============================================================================

pub fn default_host() -> String {
    "0.0.0.0".to_string()
}

pub const fn default_port() -> u16 {
    8443
}

// =============================================================================
// Relay Defaults
// =============================================================================

pub const fn default_status_interval_secs() -> u64 {
    2
}

pub const fn default_duplicate_policy() -> DuplicatePolicy {
    DuplicatePolicy::RejectNew
}

pub const fn default_max_message_size() -> usize {
    65536 // 64KB
}

pub const fn default_outbound_queue_capacity() -> usize {
    64
}

pub const fn default_ping_interval_secs() -> u64 {
    20
}

pub const fn default_ping_timeout_secs() -> u64 {
    20
}

pub const fn default_shutdown_grace_secs() -> u64 {
    5
}

// =============================================================================
// Logging Defaults
// =============================================================================

pub fn default_log_dir() -> String {
    "logs".to_string()
}

pub fn default_log_filename() -> String {
    "signal-relay.log".to_string()
}

pub fn default_rotation() -> String {
    "daily".to_string()
}

pub const fn default_enable_file_logging() -> bool {
    true
}

pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
