//! Process-wide room registry.
//!
//! Rooms live in a [`DashMap`] keyed by upper-cased code. Each room sits
//! behind its own mutex, so rooms never wait on each other; the map itself is
//! only locked (per shard) while a new room is inserted.

use super::error::{FinalizeOutcome, RoomError};
use super::room::Room;
use super::snapshot::{ParticipantSnapshot, RoomSnapshot};
use crate::broadcast::Notifier;
use crate::types::*;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Room code alphabet (excludes 0/O and 1/I to avoid confusion)
pub const CODE_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 6;

/// Upper bound on collision retries when creating a room
const MAX_CODE_ATTEMPTS: usize = 64;

/// Generate a random room code
fn generate_code<R: Rng + ?Sized>(rng: &mut R) -> RoomCode {
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Codes are case-insensitive; the map stores them upper-cased
fn normalize_code(code: &str) -> RoomCode {
    code.trim().to_ascii_uppercase()
}

/// Check that `code` could have been produced by the registry
pub fn is_valid_code(code: &str) -> bool {
    let code = normalize_code(code);
    code.len() == CODE_LENGTH && code.bytes().all(|b| CODE_CHARS.contains(&b))
}

pub struct RoomRegistry {
    rooms: DashMap<RoomCode, Arc<Mutex<Room>>>,
    /// Shared by code generation and tie-breaking. Only ever locked after a
    /// room lock, never before one.
    rng: Mutex<StdRng>,
    notifier: Arc<dyn Notifier>,
}

impl RoomRegistry {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self::with_rng(notifier, StdRng::from_os_rng())
    }

    /// Registry with an explicit random source, e.g. a seeded one in tests
    pub fn with_rng(notifier: Arc<dyn Notifier>, rng: StdRng) -> Self {
        Self {
            rooms: DashMap::new(),
            rng: Mutex::new(rng),
            notifier,
        }
    }

    fn room(&self, code: &str) -> Result<Arc<Mutex<Room>>, RoomError> {
        let key = normalize_code(code);
        // Clone the Arc so the shard guard is released before any await
        let room = self.rooms.get(&key).map(|entry| Arc::clone(entry.value()));
        room.ok_or(RoomError::NotFound(key))
    }

    fn publish(&self, snapshot: RoomSnapshot) {
        let code = snapshot.code.clone();
        self.notifier.publish(&code, snapshot);
    }

    /// Create a room for the given candidate games and return its code
    pub async fn create_room<I, S>(&self, games: I) -> Result<RoomCode, RoomError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let games = sanitize_games(games);

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code(&mut *self.rng.lock().await);

            let created = match self.rooms.entry(code.clone()) {
                Entry::Occupied(_) => None,
                Entry::Vacant(slot) => {
                    let room = Room::new(code.clone(), games.clone());
                    let snapshot = RoomSnapshot::from(&room);
                    slot.insert(Arc::new(Mutex::new(room)));
                    Some(snapshot)
                }
            };

            // Collision - try again (about one in a billion per existing room)
            if let Some(snapshot) = created {
                self.publish(snapshot);
                return Ok(code);
            }
        }

        Err(RoomError::CodeGenerationExhausted(MAX_CODE_ATTEMPTS))
    }

    /// Current snapshot of a room
    pub async fn get_room(&self, code: &str) -> Result<RoomSnapshot, RoomError> {
        let room = self.room(code)?;
        let room = room.lock().await;
        Ok(RoomSnapshot::from(&*room))
    }

    /// Join a room, or rename the participant when `participant_id` is already in it
    pub async fn join_room(
        &self,
        code: &str,
        participant_id: Option<ParticipantId>,
        name: &str,
    ) -> Result<ParticipantSnapshot, RoomError> {
        let room = self.room(code)?;
        let (participant, snapshot) = {
            let mut room = room.lock().await;
            let participant = room.join(participant_id, name)?;
            (participant, RoomSnapshot::from(&*room))
        };

        self.publish(snapshot);
        Ok(ParticipantSnapshot::from(&participant))
    }

    /// Record a participant's vote and return the updated room
    pub async fn cast_vote(
        &self,
        code: &str,
        participant_id: &str,
        choice: Option<&str>,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self.room(code)?;
        let snapshot = {
            let mut room = room.lock().await;
            room.cast_vote(participant_id, choice)?;
            RoomSnapshot::from(&*room)
        };

        self.publish(snapshot.clone());
        Ok(snapshot)
    }

    /// Finalize a room once everyone has voted. Repeated calls return the stored result.
    pub async fn start_room(&self, code: &str) -> Result<FinalizeOutcome, RoomError> {
        let room = self.room(code)?;
        let (result, snapshot) = {
            let mut room = room.lock().await;
            if let Some(result) = room.result() {
                return Ok(FinalizeOutcome::Selected(result.to_string()));
            }
            if !room.all_voted() {
                return Ok(FinalizeOutcome::Pending);
            }

            let mut rng = self.rng.lock().await;
            let result = match room.finalize(&mut *rng) {
                Some(result) => result.to_string(),
                None => return Ok(FinalizeOutcome::Pending),
            };
            (result, RoomSnapshot::from(&*room))
        };

        self.publish(snapshot);
        Ok(FinalizeOutcome::Selected(result))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.rooms.contains_key(&normalize_code(code))
    }
}
