use crate::server::RelayServer;
use axum::extract::State;
use axum::routing::get;
use std::sync::Arc;

use super::handler::websocket_handler;
use super::metrics::metrics_handler;

/// Create the Axum router for the relay endpoint and its HTTP side routes.
pub fn create_router() -> axum::Router<Arc<RelayServer>> {
    use tower_http::trace::TraceLayer;

    axum::Router::new()
        .route("/websocket/{peer_id}", get(websocket_handler))
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .layer(TraceLayer::new_for_http())
}

/// Health check endpoint
async fn health_check(
    State(server): State<Arc<RelayServer>>,
) -> axum::response::Result<&'static str> {
    if server.health_check() {
        Ok("OK")
    } else {
        Err(axum::http::StatusCode::SERVICE_UNAVAILABLE.into())
    }
}
