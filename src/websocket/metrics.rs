use crate::metrics::RelayMetricsSnapshot;
use crate::registry::RegistrySnapshot;
use crate::server::RelayServer;
use axum::extract::State;
use axum::Json;
use serde::Serialize;
use std::sync::Arc;

/// Body of `GET /metrics`.
#[derive(Debug, Serialize)]
pub struct MetricsResponse {
    pub relay: RelayMetricsSnapshot,
    pub peers: RegistrySnapshot,
}

/// Metrics API endpoint - counters plus the current registry snapshot
pub async fn metrics_handler(State(server): State<Arc<RelayServer>>) -> Json<MetricsResponse> {
    Json(MetricsResponse {
        relay: server.metrics().snapshot(),
        peers: server.registry().snapshot(),
    })
}
