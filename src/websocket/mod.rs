// WebSocket module - organized into focused submodules
//
// - handler: WebSocket upgrade handler (entry point, parses the peer id)
// - connection: per-connection lifecycle, receive loop and outbound writer
// - routes: HTTP route setup (relay endpoint, health, metrics)
// - metrics: JSON metrics endpoint

mod connection;
mod handler;
mod metrics;
mod routes;

pub use handler::websocket_handler;
pub use metrics::{metrics_handler, MetricsResponse};
pub use routes::create_router;
