//! Immutable, serializable views of a room.
//!
//! Snapshots are what leaves the registry: handed to the notifier, returned
//! from the HTTP API and pushed over WebSockets.

use super::room::Room;
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub games: Vec<String>,
    /// Games plus the random sentinel
    pub vote_options: Vec<String>,
    /// Sorted by name, case-insensitive
    pub participants: Vec<ParticipantSnapshot>,
    pub vote_counts: Vec<VoteCount>,
    pub all_voted: bool,
    pub phase: RoomPhase,
    pub result: Option<String>,
    pub created_at: String,
    /// Increases with every change to the room; later snapshots win
    pub version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParticipantSnapshot {
    pub id: ParticipantId,
    pub name: String,
    pub has_voted: bool,
    pub vote: Option<String>,
    pub status: ParticipantStatus,
}

impl From<&Participant> for ParticipantSnapshot {
    fn from(p: &Participant) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            has_voted: p.has_voted,
            vote: p.vote.clone(),
            status: if p.has_voted {
                ParticipantStatus::Voted
            } else {
                ParticipantStatus::Waiting
            },
        }
    }
}

impl From<&Room> for RoomSnapshot {
    fn from(room: &Room) -> Self {
        let mut participants: Vec<ParticipantSnapshot> =
            room.participants().map(ParticipantSnapshot::from).collect();
        // Ties on name fall back to id so the order is stable between snapshots
        participants.sort_by(|a, b| {
            a.name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.id.cmp(&b.id))
        });

        Self {
            code: room.code().to_string(),
            games: room.games().to_vec(),
            vote_options: room.vote_options(),
            participants,
            vote_counts: room.tally(),
            all_voted: room.all_voted(),
            phase: room.phase(),
            result: room.result().map(str::to_string),
            created_at: room.created_at().to_rfc3339(),
            version: room.version(),
        }
    }
}

impl RoomSnapshot {
    pub fn participant(&self, id: &str) -> Option<&ParticipantSnapshot> {
        self.participants.iter().find(|p| p.id == id)
    }

    /// Total number of recorded votes
    pub fn votes_cast(&self) -> u32 {
        self.vote_counts.iter().map(|c| c.count).sum()
    }
}
