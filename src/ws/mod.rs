pub mod handlers;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures::{sink::SinkExt, stream::StreamExt, Sink};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::{AppState, RoomSnapshot};
use crate::types::RoomCode;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub room: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection request: room={:?}", params.room);

    ws.on_upgrade(move |socket| handle_socket(socket, params, state))
}

/// Newest room version this socket has been sent.
///
/// Updates are published after the room lock is released, so two of them can
/// reach the channel out of order. Anything not newer than what the client
/// already has is dropped.
#[derive(Debug, Default)]
struct SeenVersion(Option<u64>);

impl SeenVersion {
    /// Direct replies are authoritative, e.g. after switching rooms
    fn reset(&mut self, room: &RoomSnapshot) {
        self.0 = Some(room.version);
    }

    fn is_newer(&mut self, room: &RoomSnapshot) -> bool {
        if self.0.is_some_and(|seen| room.version <= seen) {
            return false;
        }
        self.0 = Some(room.version);
        true
    }
}

/// Serialize and send; false once the socket is gone
async fn send_message<S>(sender: &mut S, msg: &ServerMessage) -> bool
where
    S: Sink<Message> + Unpin,
{
    match serde_json::to_string(msg) {
        Ok(json) => sender.send(Message::Text(json.into())).await.is_ok(),
        Err(e) => {
            tracing::error!("Failed to serialize message: {}", e);
            true
        }
    }
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, params: WsQuery, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the first snapshot so no update slips in between
    let mut updates = state.subscribe();
    let mut subscription: Option<RoomCode> = None;
    let mut seen = SeenVersion::default();

    if let Some(code) = params.room {
        let subscribe = ClientMessage::Subscribe { code };
        if let Some(reply) = handlers::handle_message(subscribe, &mut subscription, &state).await {
            if let ServerMessage::RoomUpdated { room } = &reply {
                seen.reset(room);
            }
            if !send_message(&mut sender, &reply).await {
                return;
            }
        }
    }

    loop {
        tokio::select! {
            update = updates.recv() => {
                match update {
                    Ok(update) => {
                        if subscription.as_deref() != Some(update.code.as_str())
                            || !seen.is_newer(&update.room)
                        {
                            continue;
                        }
                        let msg = ServerMessage::RoomUpdated { room: update.room };
                        if !send_message(&mut sender, &msg).await {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("WebSocket lagged behind, skipped {} room updates", skipped);
                    }
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text.as_str());

                        let response = match serde_json::from_str::<ClientMessage>(text.as_str()) {
                            Ok(client_msg) => {
                                handlers::handle_message(client_msg, &mut subscription, &state).await
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                Some(ServerMessage::error(
                                    "PARSE_ERROR",
                                    format!("Invalid message format: {}", e),
                                ))
                            }
                        };

                        if let Some(response) = response {
                            if let ServerMessage::RoomUpdated { room } = &response {
                                seen.reset(room);
                            }
                            if !send_message(&mut sender, &response).await {
                                tracing::error!("Failed to send response");
                                break;
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for room: {:?}", subscription);
}
