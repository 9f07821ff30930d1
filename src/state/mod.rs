mod error;
mod registry;
mod room;
mod snapshot;

pub use error::{FinalizeOutcome, RoomError};
pub use registry::{is_valid_code, RoomRegistry, CODE_CHARS, CODE_LENGTH};
pub use room::Room;
pub use snapshot::{ParticipantSnapshot, RoomSnapshot};

use crate::broadcast::{BroadcastNotifier, RoomUpdate};
use crate::games::GameListProvider;
use rand::rngs::StdRng;
use std::sync::Arc;
use tokio::sync::broadcast;

/// Shared application state
pub struct AppState {
    pub registry: RoomRegistry,
    /// Persisted list of selectable games
    pub games: Arc<dyn GameListProvider>,
    /// Broadcast channel the registry publishes room updates on
    pub notifier: BroadcastNotifier,
}

impl AppState {
    pub fn new(games: Arc<dyn GameListProvider>, broadcast_capacity: usize) -> Self {
        let notifier = BroadcastNotifier::new(broadcast_capacity);
        Self {
            registry: RoomRegistry::new(Arc::new(notifier.clone())),
            games,
            notifier,
        }
    }

    /// Same as [`AppState::new`] with a fixed random source
    pub fn with_rng(
        games: Arc<dyn GameListProvider>,
        broadcast_capacity: usize,
        rng: StdRng,
    ) -> Self {
        let notifier = BroadcastNotifier::new(broadcast_capacity);
        Self {
            registry: RoomRegistry::with_rng(Arc::new(notifier.clone()), rng),
            games,
            notifier,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RoomUpdate> {
        self.notifier.subscribe()
    }

    /// Create a room from the supplied games, or from the game list when none are given
    pub async fn create_room(&self, games: Option<Vec<String>>) -> Result<String, RoomError> {
        let games = match games {
            Some(games) if games.iter().any(|g| !g.trim().is_empty()) => games,
            _ => self.games.games().await,
        };
        self.registry.create_room(games).await
    }
}
