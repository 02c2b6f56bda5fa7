use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free counters for the relay.
#[derive(Debug, Default)]
pub struct RelayMetrics {
    // Connection metrics
    pub connections_accepted: AtomicU64,
    pub connections_active: AtomicU64,
    pub connections_rejected: AtomicU64,
    pub connections_closed: AtomicU64,
    pub peers_evicted: AtomicU64,

    // Frame metrics
    pub frames_received: AtomicU64,
    pub frames_forwarded: AtomicU64,
    pub frames_unroutable: AtomicU64,
    pub frames_dropped_backpressure: AtomicU64,
    pub protocol_violations: AtomicU64,
}

/// Serializable copy of [`RelayMetrics`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelayMetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_active: u64,
    pub connections_rejected: u64,
    pub connections_closed: u64,
    pub peers_evicted: u64,
    pub frames_received: u64,
    pub frames_forwarded: u64,
    pub frames_unroutable: u64,
    pub frames_dropped_backpressure: u64,
    pub protocol_violations: u64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_connections(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.connections_active.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_disconnections(&self) {
        self.connections_closed.fetch_add(1, Ordering::Relaxed);
        // Saturating: the gauge must not wrap below zero.
        let _ = self
            .connections_active
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                Some(current.saturating_sub(1))
            });
    }

    pub fn increment_rejections(&self) {
        self.connections_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_evictions(&self) {
        self.peers_evicted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_frames_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_frames_forwarded(&self) {
        self.frames_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_frames_unroutable(&self) {
        self.frames_unroutable.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_frames_dropped_backpressure(&self) {
        self.frames_dropped_backpressure
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_protocol_violations(&self) {
        self.protocol_violations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelayMetricsSnapshot {
        RelayMetricsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            connections_active: self.connections_active.load(Ordering::Relaxed),
            connections_rejected: self.connections_rejected.load(Ordering::Relaxed),
            connections_closed: self.connections_closed.load(Ordering::Relaxed),
            peers_evicted: self.peers_evicted.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_forwarded: self.frames_forwarded.load(Ordering::Relaxed),
            frames_unroutable: self.frames_unroutable.load(Ordering::Relaxed),
            frames_dropped_backpressure: self.frames_dropped_backpressure.load(Ordering::Relaxed),
            protocol_violations: self.protocol_violations.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_gauge_tracks_open_and_close() {
        let metrics = RelayMetrics::new();
        metrics.increment_connections();
        metrics.increment_connections();
        metrics.increment_disconnections();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.connections_accepted, 2);
        assert_eq!(snapshot.connections_active, 1);
        assert_eq!(snapshot.connections_closed, 1);
    }

    #[test]
    fn active_gauge_never_underflows() {
        let metrics = RelayMetrics::new();
        metrics.increment_disconnections();
        assert_eq!(metrics.snapshot().connections_active, 0);
    }

    #[test]
    fn snapshot_serializes_camel_case() {
        let metrics = RelayMetrics::new();
        metrics.increment_frames_forwarded();
        let json = serde_json::to_value(metrics.snapshot()).unwrap();
        assert_eq!(json["framesForwarded"], 1);
        assert_eq!(json["protocolViolations"], 0);
    }
}
