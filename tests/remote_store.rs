//! Integration tests for the HTTP row-store client.
//!
//! A fake row store is served by axum on an ephemeral port so every transport
//! strategy goes through real sockets.

use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tokio::{net::TcpListener, time::sleep};
use wing_challenge::dao::{
    models::PlayerId,
    remote_store::{
        HttpRemoteStore, RemoteConfig, RemoteStore, TransportError, TransportStrategy,
    },
};

#[derive(Clone, Default)]
struct Sheet {
    rows: Arc<Mutex<Vec<Value>>>,
    next_id: Arc<AtomicU64>,
    posts: Arc<AtomicUsize>,
}

impl Sheet {
    fn apply(&self, params: &HashMap<String, String>) -> Value {
        let mut rows = self.rows.lock().unwrap();
        let find = |rows: &Vec<Value>, id: Option<&String>| {
            rows.iter()
                .position(|row| Some(row["id"].as_str().unwrap_or_default()) == id.map(String::as_str))
        };

        match params.get("action").map(String::as_str) {
            None => json!({"success": true, "message": "Wing Challenge API is running"}),
            Some("getPlayers") => json!({"success": true, "players": rows.clone()}),
            Some("addPlayer") => {
                let name = params.get("name").cloned().unwrap_or_default();
                if rows
                    .iter()
                    .any(|row| row["name"].as_str().map(str::to_lowercase) == Some(name.to_lowercase()))
                {
                    return json!({"error": "Player already exists"});
                }
                let id = 1_718_000_000_000 + self.next_id.fetch_add(1, Ordering::SeqCst);
                let row = json!({
                    "id": id.to_string(),
                    "name": name,
                    "score": 0,
                    "created": "2024-06-10T06:13:20.000Z",
                    "lastUpdated": "2024-06-10T06:13:20.000Z"
                });
                rows.push(row.clone());
                json!({"success": true, "player": row})
            }
            Some("updateScore") => match find(&rows, params.get("id")) {
                Some(index) => {
                    let score: u64 = params
                        .get("score")
                        .and_then(|raw| raw.parse().ok())
                        .unwrap_or_default();
                    rows[index]["score"] = json!(score.to_string());
                    json!({"success": true, "player": rows[index].clone()})
                }
                None => json!({"error": "Player not found"}),
            },
            Some("removePlayer") => match find(&rows, params.get("id")) {
                Some(index) => {
                    rows.remove(index);
                    json!({"success": true, "message": "Player removed"})
                }
                None => json!({"error": "Player not found"}),
            },
            Some("resetScores") => {
                for row in rows.iter_mut() {
                    row["score"] = json!(0);
                }
                json!({"success": true, "message": "All scores reset"})
            }
            Some(_) => json!({"error": "Invalid action"}),
        }
    }
}

async fn exec_get(
    State(sheet): State<Sheet>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let reply = sheet.apply(&params);
    match params.get("callback") {
        Some(callback) => format!("{callback}({reply});").into_response(),
        None => Json(reply).into_response(),
    }
}

async fn exec_post(State(sheet): State<Sheet>, Json(body): Json<Value>) -> Json<Value> {
    sheet.posts.fetch_add(1, Ordering::SeqCst);
    let params: HashMap<String, String> = body
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| {
                    let value = match value {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    };
                    (key.clone(), value)
                })
                .collect()
        })
        .unwrap_or_default();
    Json(sheet.apply(&params))
}

async fn slow() -> &'static str {
    sleep(Duration::from_millis(500)).await;
    "too_late({})"
}

async fn wrong_callback() -> &'static str {
    "somebody_else({\"success\":true})"
}

async fn broken() -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn html() -> &'static str {
    "<html>Sign in</html>"
}

async fn spawn_sheet(sheet: Sheet) -> String {
    let app = Router::new()
        .route("/exec", get(exec_get).post(exec_post))
        .route("/slow", get(slow))
        .route("/wrong", get(wrong_callback))
        .route("/broken", get(broken))
        .route("/html", get(html))
        .with_state(sheet);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

fn client(url: String, transport: TransportStrategy) -> (HttpRemoteStore, Arc<dyn RemoteStore>) {
    let config = RemoteConfig::new(url)
        .with_transport(transport)
        .with_bridge_timeout(Duration::from_millis(200));
    let http = HttpRemoteStore::new(&config).unwrap();
    let store: Arc<dyn RemoteStore> = Arc::new(http.clone());
    (http, store)
}

async fn exercise_full_contract(store: &Arc<dyn RemoteStore>) {
    store.health_check().await.unwrap();

    let alice = store.add_player("Alice").await.unwrap();
    assert_eq!(alice.id, PlayerId(1_718_000_000_000));
    assert_eq!(alice.score, 0);
    assert!(alice.created.is_some());
    let bob = store.add_player("Bob").await.unwrap();

    let err = store.add_player("alice").await.unwrap_err();
    assert!(matches!(err, TransportError::Rejected { ref message, .. } if message == "Player already exists"));

    let updated = store.update_score(alice.id, 4).await.unwrap();
    assert_eq!(updated.score, 4);

    store.remove_player(bob.id).await.unwrap();
    let players = store.get_players().await.unwrap();
    assert_eq!(players.len(), 1);
    assert_eq!(players[0].name, "Alice");
    assert_eq!(players[0].score, 4);

    store.reset_scores().await.unwrap();
    let players = store.get_players().await.unwrap();
    assert_eq!(players[0].score, 0);

    let err = store.update_score(PlayerId(1), 1).await.unwrap_err();
    assert!(matches!(err, TransportError::Rejected { .. }));
}

#[tokio::test]
async fn direct_strategy_speaks_the_full_contract() {
    let sheet = Sheet::default();
    let base = spawn_sheet(sheet.clone()).await;
    let (_, store) = client(format!("{base}/exec"), TransportStrategy::Direct);

    exercise_full_contract(&store).await;
    assert_eq!(sheet.posts.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn post_strategy_sends_json_bodies() {
    let sheet = Sheet::default();
    let base = spawn_sheet(sheet.clone()).await;
    let (_, store) = client(format!("{base}/exec"), TransportStrategy::Post);

    exercise_full_contract(&store).await;
    assert!(sheet.posts.load(Ordering::SeqCst) >= 8);
}

#[tokio::test]
async fn bridged_strategy_resolves_callbacks() {
    let base = spawn_sheet(Sheet::default()).await;
    let (http, store) = client(format!("{base}/exec"), TransportStrategy::Bridged);

    exercise_full_contract(&store).await;
    assert_eq!(http.callbacks().pending(), 0);
}

#[tokio::test]
async fn bridged_timeout_unregisters_callback() {
    let base = spawn_sheet(Sheet::default()).await;
    let (http, store) = client(format!("{base}/slow"), TransportStrategy::Bridged);

    let err = store.get_players().await.unwrap_err();
    assert!(matches!(err, TransportError::Timeout { action: "getPlayers", .. }));
    assert_eq!(http.callbacks().pending(), 0);
}

#[tokio::test]
async fn bridged_reply_for_unknown_token_fails() {
    let base = spawn_sheet(Sheet::default()).await;
    let (http, store) = client(format!("{base}/wrong"), TransportStrategy::Bridged);

    let err = store.get_players().await.unwrap_err();
    assert!(matches!(err, TransportError::UnknownCallback { .. }));
    assert_eq!(http.callbacks().pending(), 0);
}

#[tokio::test]
async fn http_failures_map_to_transport_errors() {
    let base = spawn_sheet(Sheet::default()).await;

    let (_, store) = client(format!("{base}/broken"), TransportStrategy::Direct);
    let err = store.get_players().await.unwrap_err();
    assert!(matches!(err, TransportError::RequestStatus { status, .. } if status == StatusCode::INTERNAL_SERVER_ERROR));

    let (_, store) = client(format!("{base}/html"), TransportStrategy::Direct);
    let err = store.get_players().await.unwrap_err();
    assert!(matches!(err, TransportError::DecodeResponse { .. }));
    assert!(store.health_check().await.is_err());
}

#[tokio::test]
async fn unreachable_endpoint_is_a_send_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let (_, store) = client(format!("http://{addr}/exec"), TransportStrategy::Direct);
    let err = store.get_players().await.unwrap_err();
    assert!(matches!(err, TransportError::RequestSend { .. }));
}

#[test]
fn placeholder_url_is_not_configured() {
    let config = RemoteConfig::new(wing_challenge::dao::remote_store::PLACEHOLDER_URL);
    assert!(matches!(
        HttpRemoteStore::new(&config),
        Err(TransportError::NotConfigured)
    ));
}
