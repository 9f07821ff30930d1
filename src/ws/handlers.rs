//! WebSocket message dispatch
//!
//! Each socket follows at most one room. Join, vote and start act on that room.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, FinalizeOutcome};
use crate::types::RoomCode;
use std::sync::Arc;

/// Return the subscribed room or bail out with an error message
macro_rules! require_room {
    ($subscription:expr) => {
        match $subscription.as_deref() {
            Some(code) => code,
            None => {
                return Some(ServerMessage::error(
                    "NOT_SUBSCRIBED",
                    "Subscribe to a room first",
                ))
            }
        }
    };
}

/// Handle client messages and return optional response
pub async fn handle_message(
    msg: ClientMessage,
    subscription: &mut Option<RoomCode>,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::Subscribe { code } => match state.registry.get_room(&code).await {
            Ok(room) => {
                tracing::info!("Socket subscribed to room {}", room.code);
                *subscription = Some(room.code.clone());
                Some(ServerMessage::RoomUpdated { room })
            }
            Err(e) => Some(e.into()),
        },

        ClientMessage::Join {
            name,
            participant_id,
        } => {
            let code = require_room!(subscription);
            match state.registry.join_room(code, participant_id, &name).await {
                Ok(participant) => {
                    tracing::info!("{} joined room {} over WebSocket", participant.name, code);
                    Some(ServerMessage::Joined { participant })
                }
                Err(e) => Some(e.into()),
            }
        }

        ClientMessage::Vote {
            participant_id,
            choice,
        } => {
            let code = require_room!(subscription);
            match state
                .registry
                .cast_vote(code, &participant_id, choice.as_deref())
                .await
            {
                Ok(_) => Some(ServerMessage::VoteAccepted),
                Err(e) => {
                    tracing::debug!("Vote in {} rejected: {}", code, e);
                    Some(e.into())
                }
            }
        }

        ClientMessage::Start => {
            let code = require_room!(subscription);
            match state.registry.start_room(code).await {
                Ok(FinalizeOutcome::Selected(result)) => Some(ServerMessage::Result { result }),
                Ok(FinalizeOutcome::Pending) => Some(ServerMessage::Pending),
                Err(e) => Some(e.into()),
            }
        }
    }
}
