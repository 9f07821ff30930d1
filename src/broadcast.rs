//! Room update fan-out.
//!
//! The registry only knows the [`Notifier`] trait. The server wires in a
//! [`BroadcastNotifier`] whose channel every WebSocket subscribes to.

use crate::state::RoomSnapshot;
use crate::types::RoomCode;
use tokio::sync::broadcast;

/// A room snapshot published after a successful mutation
#[derive(Debug, Clone)]
pub struct RoomUpdate {
    pub code: RoomCode,
    pub room: RoomSnapshot,
}

/// Receives a snapshot after every successful room mutation.
///
/// Implementations must not block; the registry calls this outside of any
/// room lock but on the caller's task. Updates for one room may arrive out of
/// order; [`RoomSnapshot::version`] tells which is newer.
pub trait Notifier: Send + Sync {
    fn publish(&self, code: &str, snapshot: RoomSnapshot);
}

/// Notifier backed by a tokio broadcast channel
#[derive(Debug, Clone)]
pub struct BroadcastNotifier {
    tx: broadcast::Sender<RoomUpdate>,
}

impl BroadcastNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomUpdate> {
        self.tx.subscribe()
    }
}

impl Notifier for BroadcastNotifier {
    fn publish(&self, code: &str, snapshot: RoomSnapshot) {
        // Ignore send errors (no receivers connected is fine)
        let _ = self.tx.send(RoomUpdate {
            code: code.to_string(),
            room: snapshot,
        });
    }
}
