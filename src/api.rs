//! HTTP API endpoints.
//!
//! Thin wrappers around [`AppState`]: decode the request, call the registry
//! or game list, map the outcome to a status code.

use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::games::GameListError;
use crate::protocol::{
    CreateRoomRequest, CreateRoomResponse, ErrorResponse, JoinRequest, StartResponse, VoteRequest,
};
use crate::state::{AppState, FinalizeOutcome, RoomError};
use crate::ws;

fn error_response(status: StatusCode, code: &str, msg: String) -> Response {
    (
        status,
        Json(ErrorResponse {
            code: code.to_string(),
            msg,
        }),
    )
        .into_response()
}

fn invalid_body(detail: impl std::fmt::Display) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        "INVALID_BODY",
        format!("Invalid request body: {}", detail),
    )
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        let status = match &self {
            RoomError::NotFound(_) => StatusCode::NOT_FOUND,
            RoomError::InvalidOption(_)
            | RoomError::ParticipantNotFound(_)
            | RoomError::EmptyName => StatusCode::BAD_REQUEST,
            RoomError::AlreadyVoted(_) => StatusCode::CONFLICT,
            RoomError::CodeGenerationExhausted(_) => {
                tracing::error!("Room creation failed: {}", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        error_response(status, self.code(), self.to_string())
    }
}

impl IntoResponse for GameListError {
    fn into_response(self) -> Response {
        tracing::error!("Game list error: {}", self);
        error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "GAME_LIST_FAILED",
            self.to_string(),
        )
    }
}

/// All API and WebSocket routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/games", get(list_games).post(save_games))
        .route("/api/rooms", post(create_room))
        .route("/api/rooms/{code}", get(get_room))
        .route("/api/rooms/{code}/join", post(join_room))
        .route("/api/rooms/{code}/vote", post(cast_vote))
        .route("/api/rooms/{code}/start", post(start_room))
        .route("/ws", get(ws::ws_handler))
        .with_state(state)
}

/// GET /api/games
pub async fn list_games(State(state): State<Arc<AppState>>) -> Json<Vec<String>> {
    Json(state.games.games().await)
}

/// POST /api/games
///
/// Replaces the persisted game list. Responds with the list as stored.
pub async fn save_games(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Response {
    let Json(games) = match payload {
        Ok(games) => games,
        Err(rejection) => return invalid_body(rejection.body_text()),
    };

    match state.games.save_games(games).await {
        Ok(saved) => Json(saved).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/rooms
///
/// The body is optional; without `games` the room uses the persisted list.
pub async fn create_room(State(state): State<Arc<AppState>>, body: Bytes) -> Response {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateRoomRequest::default()
    } else {
        match serde_json::from_slice::<CreateRoomRequest>(&body) {
            Ok(request) => request,
            Err(e) => return invalid_body(e),
        }
    };

    match state.create_room(request.games).await {
        Ok(code) => {
            tracing::info!("Room {} created", code);
            Json(CreateRoomResponse { code }).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// GET /api/rooms/{code}
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    match state.registry.get_room(&code).await {
        Ok(room) => Json(room).into_response(),
        Err(e) => e.into_response(),
    }
}

/// POST /api/rooms/{code}/join
pub async fn join_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return invalid_body(rejection.body_text()),
    };

    match state
        .registry
        .join_room(&code, request.participant_id, &request.name)
        .await
    {
        Ok(participant) => {
            tracing::info!("{} joined room {} as {}", participant.name, code, participant.id);
            Json(participant).into_response()
        }
        Err(e) => {
            tracing::debug!("Join to {} rejected: {}", code, e);
            e.into_response()
        }
    }
}

/// POST /api/rooms/{code}/vote
pub async fn cast_vote(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    payload: Result<Json<VoteRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match payload {
        Ok(request) => request,
        Err(rejection) => return invalid_body(rejection.body_text()),
    };

    match state
        .registry
        .cast_vote(&code, &request.participant_id, request.choice.as_deref())
        .await
    {
        Ok(room) => {
            tracing::debug!("Vote recorded in room {}", room.code);
            Json(room).into_response()
        }
        Err(e) => {
            tracing::debug!("Vote in {} rejected: {}", code, e);
            e.into_response()
        }
    }
}

/// POST /api/rooms/{code}/start
///
/// 200 with the selected game, or 202 while votes are outstanding.
pub async fn start_room(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
) -> Response {
    match state.registry.start_room(&code).await {
        Ok(FinalizeOutcome::Selected(result)) => {
            tracing::info!("Room {} picked {}", code, result);
            Json(StartResponse::Selected { result }).into_response()
        }
        Ok(FinalizeOutcome::Pending) => (
            StatusCode::ACCEPTED,
            Json(StartResponse::Pending { pending: true }),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
