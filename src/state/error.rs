use crate::types::{ParticipantId, RoomCode};

/// Errors returned by room and registry operations.
///
/// Everything except [`RoomError::CodeGenerationExhausted`] is an expected
/// outcome of user input and leaves the room untouched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("room {0} not found")]
    NotFound(RoomCode),

    #[error("'{0}' is not a valid option for this room")]
    InvalidOption(String),

    #[error("participant {0} not found")]
    ParticipantNotFound(ParticipantId),

    #[error("participant {0} has already voted")]
    AlreadyVoted(ParticipantId),

    #[error("display name must not be empty")]
    EmptyName,

    #[error("no unique room code found after {0} attempts")]
    CodeGenerationExhausted(usize),
}

impl RoomError {
    /// Stable machine-readable code for clients
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::NotFound(_) => "ROOM_NOT_FOUND",
            RoomError::InvalidOption(_) => "INVALID_OPTION",
            RoomError::ParticipantNotFound(_) => "PARTICIPANT_NOT_FOUND",
            RoomError::AlreadyVoted(_) => "ALREADY_VOTED",
            RoomError::EmptyName => "EMPTY_NAME",
            RoomError::CodeGenerationExhausted(_) => "CODE_GENERATION_EXHAUSTED",
        }
    }
}

/// Outcome of asking a room to pick its game
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The room is finalized with this game
    Selected(String),
    /// Not every participant has voted yet
    Pending,
}
