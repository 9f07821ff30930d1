use crate::state::{ParticipantSnapshot, RoomError, RoomSnapshot};
use crate::types::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Follow updates for a room (replaces any previous subscription)
    Subscribe {
        code: RoomCode,
    },
    /// Join the subscribed room. Passing a known id renames that participant.
    Join {
        name: String,
        #[serde(default)]
        participant_id: Option<ParticipantId>,
    },
    Vote {
        participant_id: ParticipantId,
        #[serde(default)]
        choice: Option<String>,
    },
    /// Ask the subscribed room to pick its game
    Start,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    RoomUpdated {
        room: RoomSnapshot,
    },
    Joined {
        participant: ParticipantSnapshot,
    },
    VoteAccepted,
    Result {
        result: String,
    },
    /// Not everyone has voted yet
    Pending,
    Error {
        code: String,
        msg: String,
    },
}

impl ServerMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        ServerMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

impl From<RoomError> for ServerMessage {
    fn from(e: RoomError) -> Self {
        ServerMessage::error(e.code(), e.to_string())
    }
}

// HTTP bodies

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    #[serde(default)]
    pub games: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomResponse {
    pub code: RoomCode,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinRequest {
    pub name: String,
    #[serde(default)]
    pub participant_id: Option<ParticipantId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub participant_id: ParticipantId,
    #[serde(default)]
    pub choice: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum StartResponse {
    Selected { result: String },
    Pending { pending: bool },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub msg: String,
}
