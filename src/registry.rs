//! In-memory map of which peers are currently reachable.
//!
//! The registry is the only state shared between connection tasks. It is a
//! sharded concurrent map, so every operation is a short, non-awaiting critical
//! section on one shard and readers never block writers on other identifiers.
//! It stores non-owning [`PeerHandle`]s: a handle can enqueue frames for a
//! connection and ask it to close, but the connection task alone owns the
//! socket and tears it down.

use std::fmt;
use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::protocol::{ConnectionId, PeerId};

/// What to do when a connection claims an identifier that is already live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Refuse the newcomer and keep the established peer.
    #[default]
    RejectNew,
    /// Replace the established peer and tell its connection to close.
    EvictExisting,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegisterError {
    #[error("peer {peer_id} is already connected")]
    AlreadyConnected { peer_id: PeerId },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeliveryError {
    #[error("outbound queue for peer {0} is full")]
    QueueFull(PeerId),
    #[error("connection for peer {0} is closing")]
    Closed(PeerId),
}

/// Lookup-only reference to a live connection.
#[derive(Debug, Clone)]
pub struct PeerHandle {
    peer_id: PeerId,
    connection_id: ConnectionId,
    outbound: mpsc::Sender<Message>,
    close_signal: CancellationToken,
}

impl PeerHandle {
    pub fn new(peer_id: PeerId, outbound: mpsc::Sender<Message>) -> Self {
        Self {
            peer_id,
            connection_id: Uuid::new_v4(),
            outbound,
            close_signal: CancellationToken::new(),
        }
    }

    pub fn peer_id(&self) -> PeerId {
        self.peer_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Token cancelled when the connection should shut down.
    pub fn close_signal(&self) -> &CancellationToken {
        &self.close_signal
    }

    /// Ask the owning connection task to close.
    pub fn request_close(&self) {
        self.close_signal.cancel();
    }

    /// Enqueue a frame on this connection's outbound queue without waiting.
    ///
    /// The caller's own loop never waits on the destination; a full queue
    /// drops the frame.
    pub fn try_deliver(&self, frame: Message) -> Result<(), DeliveryError> {
        if self.close_signal.is_cancelled() {
            return Err(DeliveryError::Closed(self.peer_id));
        }
        self.outbound.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => DeliveryError::QueueFull(self.peer_id),
            TrySendError::Closed(_) => DeliveryError::Closed(self.peer_id),
        })
    }
}

/// Point-in-time view used for status reporting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrySnapshot {
    pub count: usize,
    /// Sorted, unique.
    pub peer_ids: Vec<PeerId>,
}

impl fmt::Display for RegistrySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for peer_id in &self.peer_ids {
            write!(f, "[{peer_id}]")?;
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct PeerRegistry {
    peers: DashMap<PeerId, PeerHandle>,
    policy: DuplicatePolicy,
}

impl PeerRegistry {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self {
            peers: DashMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Insert `handle` under its peer id, applying the duplicate policy.
    ///
    /// Returns the evicted handle when [`DuplicatePolicy::EvictExisting`]
    /// replaced a live entry; that handle has already been asked to close.
    pub fn register(&self, handle: PeerHandle) -> Result<Option<PeerHandle>, RegisterError> {
        let peer_id = handle.peer_id;
        match self.peers.entry(peer_id) {
            Entry::Vacant(slot) => {
                slot.insert(handle);
                Ok(None)
            }
            Entry::Occupied(mut slot) => match self.policy {
                DuplicatePolicy::RejectNew => Err(RegisterError::AlreadyConnected { peer_id }),
                DuplicatePolicy::EvictExisting => {
                    let evicted = slot.insert(handle);
                    evicted.request_close();
                    Ok(Some(evicted))
                }
            },
        }
    }

    /// Remove the entry for `peer_id` whoever owns it. Absent ids are a no-op.
    pub fn unregister(&self, peer_id: PeerId) -> Option<PeerHandle> {
        self.peers.remove(&peer_id).map(|(_, handle)| handle)
    }

    /// Remove the entry only if it still belongs to `connection_id`.
    pub fn unregister_connection(&self, peer_id: PeerId, connection_id: ConnectionId) -> bool {
        self.peers
            .remove_if(&peer_id, |_, handle| handle.connection_id == connection_id)
            .is_some()
    }

    pub fn lookup(&self, peer_id: PeerId) -> Option<PeerHandle> {
        self.peers.get(&peer_id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, peer_id: PeerId) -> bool {
        self.peers.contains_key(&peer_id)
    }

    /// Whether `connection_id` is the current owner of `peer_id`.
    pub fn is_current(&self, peer_id: PeerId, connection_id: ConnectionId) -> bool {
        self.peers
            .get(&peer_id)
            .is_some_and(|entry| entry.connection_id == connection_id)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn snapshot(&self) -> RegistrySnapshot {
        let mut peer_ids: Vec<PeerId> = self.peers.iter().map(|entry| *entry.key()).collect();
        peer_ids.sort_unstable();
        RegistrySnapshot {
            count: peer_ids.len(),
            peer_ids,
        }
    }
}

/// Ties one registry entry to the lifetime of a connection task.
///
/// Dropping the guard removes the entry (if this connection still owns it), so
/// deregistration happens on every exit path of the task, including panics and
/// early returns.
#[derive(Debug)]
pub struct PeerRegistration {
    registry: Arc<PeerRegistry>,
    handle: PeerHandle,
}

impl PeerRegistration {
    /// Register `handle` and return a guard that deregisters it on drop.
    pub fn acquire(
        registry: &Arc<PeerRegistry>,
        handle: PeerHandle,
    ) -> Result<(Self, Option<PeerHandle>), RegisterError> {
        let evicted = registry.register(handle.clone())?;
        Ok((
            Self {
                registry: Arc::clone(registry),
                handle,
            },
            evicted,
        ))
    }

    pub fn handle(&self) -> &PeerHandle {
        &self.handle
    }

    pub fn peer_id(&self) -> PeerId {
        self.handle.peer_id
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.handle.connection_id
    }

    /// Whether the registry still maps this peer id to this connection.
    pub fn is_current(&self) -> bool {
        self.registry
            .is_current(self.handle.peer_id, self.handle.connection_id)
    }
}

impl Drop for PeerRegistration {
    fn drop(&mut self) {
        self.registry
            .unregister_connection(self.handle.peer_id, self.handle.connection_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(peer_id: PeerId) -> (PeerHandle, mpsc::Receiver<Message>) {
        let (tx, rx) = mpsc::channel(4);
        (PeerHandle::new(peer_id, tx), rx)
    }

    #[test]
    fn register_then_lookup() {
        let registry = PeerRegistry::default();
        let (peer, _rx) = handle(1);
        let connection_id = peer.connection_id();

        assert!(registry.register(peer).unwrap().is_none());
        let found = registry.lookup(1).expect("peer should be registered");
        assert_eq!(found.connection_id(), connection_id);
        assert!(registry.lookup(2).is_none());
    }

    #[test]
    fn reject_new_keeps_existing_peer() {
        let registry = PeerRegistry::new(DuplicatePolicy::RejectNew);
        let (first, _rx1) = handle(5);
        let (second, _rx2) = handle(5);
        let first_id = first.connection_id();

        registry.register(first).unwrap();
        let err = registry.register(second.clone()).unwrap_err();
        assert_eq!(err, RegisterError::AlreadyConnected { peer_id: 5 });

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(5).unwrap().connection_id(), first_id);
        assert!(!second.close_signal().is_cancelled());
    }

    #[test]
    fn evict_existing_replaces_and_closes_old_peer() {
        let registry = PeerRegistry::new(DuplicatePolicy::EvictExisting);
        let (first, _rx1) = handle(5);
        let (second, _rx2) = handle(5);
        let second_id = second.connection_id();

        registry.register(first.clone()).unwrap();
        let evicted = registry.register(second).unwrap().expect("old peer evicted");

        assert_eq!(evicted.connection_id(), first.connection_id());
        assert!(first.close_signal().is_cancelled());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup(5).unwrap().connection_id(), second_id);
    }

    #[test]
    fn unregister_is_idempotent() {
        let registry = PeerRegistry::default();
        assert!(registry.unregister(42).is_none());

        let (peer, _rx) = handle(42);
        registry.register(peer).unwrap();
        assert!(registry.unregister(42).is_some());
        assert!(registry.unregister(42).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn stale_connection_cannot_remove_successor() {
        let registry = PeerRegistry::new(DuplicatePolicy::EvictExisting);
        let (first, _rx1) = handle(9);
        let (second, _rx2) = handle(9);
        let stale_id = first.connection_id();

        registry.register(first).unwrap();
        registry.register(second.clone()).unwrap();

        assert!(!registry.unregister_connection(9, stale_id));
        assert!(registry.is_current(9, second.connection_id()));
        assert!(registry.unregister_connection(9, second.connection_id()));
        assert!(!registry.contains(9));
    }

    #[test]
    fn snapshot_is_sorted_and_counted() {
        let registry = PeerRegistry::default();
        let mut receivers = Vec::new();
        for peer_id in [30, 10, 20] {
            let (peer, rx) = handle(peer_id);
            receivers.push(rx);
            registry.register(peer).unwrap();
        }

        let snapshot = registry.snapshot();
        assert_eq!(snapshot.count, 3);
        assert_eq!(snapshot.peer_ids, vec![10, 20, 30]);
        assert_eq!(snapshot.to_string(), "[10][20][30]");
    }

    #[test]
    fn registration_guard_deregisters_on_drop() {
        let registry = Arc::new(PeerRegistry::default());
        let (peer, _rx) = handle(3);

        let (registration, evicted) = PeerRegistration::acquire(&registry, peer).unwrap();
        assert!(evicted.is_none());
        assert!(registration.is_current());
        assert!(registry.contains(3));

        drop(registration);
        assert!(!registry.contains(3));
    }

    #[test]
    fn registration_guard_is_rejected_for_live_duplicate() {
        let registry = Arc::new(PeerRegistry::default());
        let (first, _rx1) = handle(3);
        let (second, _rx2) = handle(3);

        let (_held, _) = PeerRegistration::acquire(&registry, first).unwrap();
        let err = PeerRegistration::acquire(&registry, second).unwrap_err();
        assert_eq!(err, RegisterError::AlreadyConnected { peer_id: 3 });
        assert!(registry.contains(3));
    }

    #[test]
    fn deliver_reports_full_and_closed_queues() {
        let (tx, rx) = mpsc::channel(1);
        let peer = PeerHandle::new(8, tx);

        peer.try_deliver(Message::Text("one".into())).unwrap();
        assert_eq!(
            peer.try_deliver(Message::Text("two".into())),
            Err(DeliveryError::QueueFull(8))
        );

        drop(rx);
        assert_eq!(
            peer.try_deliver(Message::Text("three".into())),
            Err(DeliveryError::Closed(8))
        );
    }

    #[test]
    fn deliver_refuses_after_close_requested() {
        let (peer, mut rx) = handle(4);
        peer.request_close();
        assert_eq!(
            peer.try_deliver(Message::Text("late".into())),
            Err(DeliveryError::Closed(4))
        );
        assert!(rx.try_recv().is_err());
    }
}
