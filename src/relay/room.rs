//! Room pairing and message forwarding.
//!
//! Broadcasting every frame to every other connected socket breaks
//! negotiation as soon as a third client shows up. Rooms pair participants
//! explicitly instead: two peers per room id, a third join is refused.

use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Exactly two participants per room
pub const ROOM_CAPACITY: usize = 2;

/// Relay-side errors
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("Room already has {ROOM_CAPACITY} participants")]
    RoomFull,
}

/// One connected participant's outbound queue
struct PeerSlot {
    id: Uuid,
    tx: mpsc::UnboundedSender<String>,
}

/// A signaling room holding at most two peers
#[derive(Default)]
struct Room {
    peers: Mutex<Vec<PeerSlot>>,
}

/// Registry of all active rooms
pub struct RoomRegistry {
    rooms: DashMap<String, Arc<Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
        }
    }

    /// Join a room, creating it on first join. Fails when the room already
    /// holds two peers.
    pub fn join(
        &self,
        room_id: &str,
        peer_id: Uuid,
        tx: mpsc::UnboundedSender<String>,
    ) -> Result<(), RelayError> {
        let room = self
            .rooms
            .entry(room_id.to_string())
            .or_insert_with(|| Arc::new(Room::default()))
            .value()
            .clone();

        let mut peers = room.peers.lock();
        if peers.len() >= ROOM_CAPACITY {
            return Err(RelayError::RoomFull);
        }
        peers.push(PeerSlot { id: peer_id, tx });
        Ok(())
    }

    /// Forward an opaque payload to the other occupant of the room.
    /// Returns how many peers it was delivered to (0 when the sender is
    /// still alone - the payload is dropped, the peer will resend).
    pub fn forward(&self, room_id: &str, sender: Uuid, payload: &str) -> usize {
        let Some(room) = self.rooms.get(room_id).map(|r| r.value().clone()) else {
            return 0;
        };

        let peers = room.peers.lock();
        let mut delivered = 0;
        for peer in peers.iter().filter(|p| p.id != sender) {
            if peer.tx.send(payload.to_string()).is_ok() {
                delivered += 1;
            }
        }
        delivered
    }

    /// Remove a peer; empty rooms are dropped
    pub fn leave(&self, room_id: &str, peer_id: Uuid) {
        if let Some(room) = self.rooms.get(room_id).map(|r| r.value().clone()) {
            let mut peers = room.peers.lock();
            peers.retain(|p| p.id != peer_id);
            let empty = peers.is_empty();
            drop(peers);

            if empty {
                self.rooms
                    .remove_if(room_id, |_, room| room.peers.lock().is_empty());
                debug!(room = %room_id, "Dropped empty room");
            }
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.rooms.len()
    }

    pub fn connected_peers(&self) -> usize {
        self.rooms.iter().map(|r| r.peers.lock().len()).sum()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> (Uuid, mpsc::UnboundedSender<String>, mpsc::UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Uuid::new_v4(), tx, rx)
    }

    #[test]
    fn third_join_is_rejected() {
        let registry = RoomRegistry::new();
        let (a, a_tx, _a_rx) = peer();
        let (b, b_tx, _b_rx) = peer();
        let (c, c_tx, _c_rx) = peer();

        registry.join("duel", a, a_tx).unwrap();
        registry.join("duel", b, b_tx).unwrap();
        assert!(matches!(
            registry.join("duel", c, c_tx),
            Err(RelayError::RoomFull)
        ));

        // But a different room is fine
        let (d, d_tx, _d_rx) = peer();
        registry.join("other", d, d_tx).unwrap();
        assert_eq!(registry.active_rooms(), 2);
    }

    #[tokio::test]
    async fn forward_reaches_only_the_other_peer() {
        let registry = RoomRegistry::new();
        let (a, a_tx, mut a_rx) = peer();
        let (b, b_tx, mut b_rx) = peer();
        registry.join("duel", a, a_tx).unwrap();
        registry.join("duel", b, b_tx).unwrap();

        assert_eq!(registry.forward("duel", a, r#"{"offer":{}}"#), 1);
        assert_eq!(b_rx.recv().await.unwrap(), r#"{"offer":{}}"#);
        assert!(a_rx.try_recv().is_err());
    }

    #[test]
    fn forward_before_pairing_is_dropped() {
        let registry = RoomRegistry::new();
        let (a, a_tx, _a_rx) = peer();
        registry.join("duel", a, a_tx).unwrap();
        assert_eq!(registry.forward("duel", a, "early"), 0);
    }

    #[test]
    fn leaving_frees_the_slot_and_drops_empty_rooms() {
        let registry = RoomRegistry::new();
        let (a, a_tx, _a_rx) = peer();
        let (b, b_tx, _b_rx) = peer();
        registry.join("duel", a, a_tx).unwrap();
        registry.join("duel", b, b_tx).unwrap();

        registry.leave("duel", a);
        let (c, c_tx, _c_rx) = peer();
        registry.join("duel", c, c_tx).unwrap();

        registry.leave("duel", b);
        registry.leave("duel", c);
        assert_eq!(registry.active_rooms(), 0);
        assert_eq!(registry.connected_peers(), 0);
    }
}
