#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions
)]

//! # Signal Relay
//!
//! A WebSocket signaling relay. Peers connect at `/websocket/{peer_id}` and
//! send JSON envelopes `{"userId", "toUserId", "message"}`; the relay checks
//! that `userId` matches the connection's bound identifier and forwards the
//! frame unchanged to whichever connection holds `toUserId`. Nothing is
//! persisted and nothing is acknowledged.

/// Static file serving for the client page
pub mod assets;

/// Server configuration and environment variables
pub mod config;

/// Structured logging configuration
pub mod logging;

/// Relay counters
pub mod metrics;

/// Routing envelope and identifiers
pub mod protocol;

/// Live peer table
pub mod registry;

/// TLS setup
pub mod security;

/// Relay orchestration
pub mod server;

/// WebSocket endpoint and HTTP routes
pub mod websocket;
