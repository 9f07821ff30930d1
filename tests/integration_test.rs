use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use gamevote::api;
use gamevote::games::{FileGameList, GameListProvider};
use gamevote::protocol::{ClientMessage, ServerMessage};
use gamevote::state::{is_valid_code, AppState, RoomSnapshot};
use gamevote::types::{ParticipantStatus, RoomPhase, DEFAULT_GAMES, RANDOM_OPTION};
use gamevote::ws::handlers::handle_message;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    state: Arc<AppState>,
    router: Router,
    _dir: TempDir,
}

fn test_app() -> TestApp {
    let dir = tempfile::tempdir().expect("tempdir");
    let games = Arc::new(FileGameList::new(dir.path().join("games.txt")));
    let state = Arc::new(AppState::with_rng(games, 64, StdRng::seed_from_u64(2024)));
    TestApp {
        router: api::router(state.clone()),
        state,
        _dir: dir,
    }
}

async fn call(app: &TestApp, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(body) => {
            request = request.header(header::CONTENT_TYPE, "application/json");
            Body::from(body.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .router
        .clone()
        .oneshot(request.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn create_room(app: &TestApp, games: &[&str]) -> String {
    let (status, body) = call(app, Method::POST, "/api/rooms", Some(json!({ "games": games }))).await;
    assert_eq!(status, StatusCode::OK);
    body["code"].as_str().unwrap().to_string()
}

async fn join(app: &TestApp, code: &str, name: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        &format!("/api/rooms/{code}/join"),
        Some(json!({ "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["id"].as_str().unwrap().to_string()
}

async fn vote(app: &TestApp, code: &str, participant_id: &str, choice: &str) -> (StatusCode, Value) {
    call(
        app,
        Method::POST,
        &format!("/api/rooms/{code}/vote"),
        Some(json!({ "participant_id": participant_id, "choice": choice })),
    )
    .await
}

/// End-to-end flow over HTTP: create, join, vote, start
#[tokio::test]
async fn test_full_voting_flow() {
    let app = test_app();
    let mut updates = app.state.subscribe();

    let code = create_room(&app, &["Catan", "Chess"]).await;
    assert!(is_valid_code(&code));

    let (status, room) = call(&app, Method::GET, &format!("/api/rooms/{code}"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["participants"], json!([]));
    assert_eq!(room["all_voted"], false);
    assert_eq!(room["vote_options"], json!(["Catan", "Chess", "Random"]));

    let ann = join(&app, &code, "Ann").await;
    let bo = join(&app, &code, "Bo").await;

    let (status, body) = call(&app, Method::POST, &format!("/api/rooms/{code}/start"), None).await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body, json!({ "pending": true }));

    let (status, _) = vote(&app, &code, &ann, "Catan").await;
    assert_eq!(status, StatusCode::OK);
    let (status, room) = vote(&app, &code, &bo, "Chess").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["all_voted"], true);

    let (status, body) = call(&app, Method::POST, &format!("/api/rooms/{code}/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    let result = body["result"].as_str().unwrap().to_string();
    assert!(result == "Catan" || result == "Chess");

    // Idempotent
    let (_, again) = call(&app, Method::POST, &format!("/api/rooms/{code}/start"), None).await;
    assert_eq!(again["result"], result.as_str());

    // create + 2 joins + 2 votes + finalize
    let mut received = Vec::new();
    while let Ok(update) = updates.try_recv() {
        received.push(update);
    }
    assert_eq!(received.len(), 6);
    let last: &RoomSnapshot = &received.last().unwrap().room;
    assert_eq!(last.phase, RoomPhase::Finalized);
    assert_eq!(last.result.as_deref(), Some(result.as_str()));
}

#[tokio::test]
async fn test_room_not_found() {
    let app = test_app();

    let (status, body) = call(&app, Method::GET, "/api/rooms/ZZZZZZ", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "ROOM_NOT_FOUND");

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/rooms/ZZZZZZ/join",
        Some(json!({ "name": "Ann" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(&app, Method::POST, "/api/rooms/ZZZZZZ/start", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_lowercase_code_resolves() {
    let app = test_app();
    let code = create_room(&app, &["Catan"]).await;

    let (status, room) = call(
        &app,
        Method::GET,
        &format!("/api/rooms/{}", code.to_lowercase()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(room["code"], code.as_str());
}

#[tokio::test]
async fn test_vote_rejections() {
    let app = test_app();
    let code = create_room(&app, &["Catan", "Chess"]).await;
    let ann = join(&app, &code, "Ann").await;

    let (status, body) = vote(&app, &code, &ann, "Checkers").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_OPTION");

    let (status, body) = vote(&app, &code, "ghost", "Catan").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "PARTICIPANT_NOT_FOUND");

    let (status, _) = vote(&app, &code, &ann, "catan").await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = vote(&app, &code, &ann, "Chess").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "ALREADY_VOTED");

    let room = app.state.registry.get_room(&code).await.unwrap();
    assert_eq!(room.votes_cast(), 1);
    assert_eq!(room.participant(&ann).unwrap().vote.as_deref(), Some("Catan"));
}

#[tokio::test]
async fn test_join_validation_and_reconnect() {
    let app = test_app();
    let code = create_room(&app, &["Catan"]).await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/rooms/{code}/join"),
        Some(json!({ "name": "   " })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "EMPTY_NAME");

    let ann = join(&app, &code, "Ann").await;
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/rooms/{code}/join"),
        Some(json!({ "name": "Annie", "participant_id": &ann })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], ann.as_str());
    assert_eq!(body["name"], "Annie");

    let room = app.state.registry.get_room(&code).await.unwrap();
    assert_eq!(room.participants.len(), 1);
    assert_eq!(room.participants[0].status, ParticipantStatus::Waiting);
}

#[tokio::test]
async fn test_random_vote_with_single_game() {
    let app = test_app();
    let code = create_room(&app, &["Catan"]).await;
    let ann = join(&app, &code, "Ann").await;

    let (status, _) = vote(&app, &code, &ann, RANDOM_OPTION).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&app, Method::POST, &format!("/api/rooms/{code}/start"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["result"], "Catan");
}

#[tokio::test]
async fn test_create_room_without_body_uses_game_list() {
    let app = test_app();

    let (status, games) = call(&app, Method::GET, "/api/games", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(games.as_array().unwrap().len(), DEFAULT_GAMES.len());

    let (status, saved) = call(
        &app,
        Method::POST,
        "/api/games",
        Some(json!([" Go ", "go", "", "Chess"])),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved, json!(["Go", "Chess"]));
    assert_eq!(app.state.games.games().await, vec!["Go", "Chess"]);

    let (status, body) = call(&app, Method::POST, "/api/rooms", None).await;
    assert_eq!(status, StatusCode::OK);
    let code = body["code"].as_str().unwrap();

    let room = app.state.registry.get_room(code).await.unwrap();
    assert_eq!(room.games, vec!["Go", "Chess"]);
}

#[tokio::test]
async fn test_create_room_rejects_malformed_body() {
    let app = test_app();
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/rooms")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["code"], "INVALID_BODY");
}

#[tokio::test]
async fn test_incomplete_bodies_get_json_errors() {
    let app = test_app();
    let code = create_room(&app, &["Catan"]).await;
    let ann = join(&app, &code, "Ann").await;

    // Join without a name
    let (status, body) = call(&app, Method::POST, &format!("/api/rooms/{code}/join"), Some(json!({}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
    assert!(body["msg"].as_str().unwrap().contains("name"));

    // Vote without a participant
    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/rooms/{code}/vote"),
        Some(json!({ "choice": "Catan" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");
    assert!(body["msg"].as_str().unwrap().contains("participant_id"));

    // Game list that is not a list
    let (status, body) = call(&app, Method::POST, "/api/games", Some(json!({ "games": "Go" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "INVALID_BODY");

    // Nothing changed
    let room = app.state.registry.get_room(&code).await.unwrap();
    assert_eq!(room.participants.len(), 1);
    assert!(!room.participant(&ann).unwrap().has_voted);
    assert_eq!(app.state.games.games().await.len(), DEFAULT_GAMES.len());
}

/// Same flow as above, driven through the WebSocket dispatcher
#[tokio::test]
async fn test_websocket_flow() {
    let app = test_app();
    let state = &app.state;
    let code = state
        .create_room(Some(vec!["Catan".to_string(), "Chess".to_string()]))
        .await
        .unwrap();
    let mut subscription = None;

    // Actions before subscribing are rejected
    let reply = handle_message(ClientMessage::Start, &mut subscription, state).await;
    assert!(matches!(reply, Some(ServerMessage::Error { ref code, .. }) if code == "NOT_SUBSCRIBED"));

    let reply = handle_message(
        ClientMessage::Subscribe {
            code: code.to_lowercase(),
        },
        &mut subscription,
        state,
    )
    .await;
    match reply {
        Some(ServerMessage::RoomUpdated { room }) => assert_eq!(room.code, code),
        other => panic!("Expected RoomUpdated, got {other:?}"),
    }
    assert_eq!(subscription.as_deref(), Some(code.as_str()));

    let ann = match handle_message(
        ClientMessage::Join {
            name: "Ann".to_string(),
            participant_id: None,
        },
        &mut subscription,
        state,
    )
    .await
    {
        Some(ServerMessage::Joined { participant }) => participant,
        other => panic!("Expected Joined, got {other:?}"),
    };

    let reply = handle_message(ClientMessage::Start, &mut subscription, state).await;
    assert!(matches!(reply, Some(ServerMessage::Pending)));

    let reply = handle_message(
        ClientMessage::Vote {
            participant_id: ann.id.clone(),
            choice: Some("Chess".to_string()),
        },
        &mut subscription,
        state,
    )
    .await;
    assert!(matches!(reply, Some(ServerMessage::VoteAccepted)));

    let reply = handle_message(
        ClientMessage::Vote {
            participant_id: ann.id.clone(),
            choice: Some("Catan".to_string()),
        },
        &mut subscription,
        state,
    )
    .await;
    assert!(matches!(reply, Some(ServerMessage::Error { ref code, .. }) if code == "ALREADY_VOTED"));

    let reply = handle_message(ClientMessage::Start, &mut subscription, state).await;
    match reply {
        Some(ServerMessage::Result { result }) => assert_eq!(result, "Chess"),
        other => panic!("Expected Result, got {other:?}"),
    }
}

#[tokio::test]
async fn test_websocket_subscribe_unknown_room() {
    let app = test_app();
    let mut subscription = None;

    let reply = handle_message(
        ClientMessage::Subscribe {
            code: "ZZZZZZ".to_string(),
        },
        &mut subscription,
        &app.state,
    )
    .await;
    assert!(matches!(reply, Some(ServerMessage::Error { ref code, .. }) if code == "ROOM_NOT_FOUND"));
    assert!(subscription.is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_http_joins() {
    let app = Arc::new(test_app());
    let code = create_room(&app, &["Catan"]).await;

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let app = app.clone();
            let code = code.clone();
            tokio::spawn(async move { join(&app, &code, &format!("p{i}")).await })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        ids.insert(handle.await.unwrap());
    }
    assert_eq!(ids.len(), 32);

    let room = app.state.registry.get_room(&code).await.unwrap();
    assert_eq!(room.participants.len(), 32);
}
