//! End-to-end client tests against a local mock agent

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};

use parley_a2a::{
    A2aClient, A2aError, ConnectionConfig, Message, PollConfig, PollStop, SendMessageResponse, TaskState,
    apply_compat_defaults, poll_task, validate_card,
};

#[derive(Default)]
struct AgentState {
    polls: AtomicU32,
    requests: std::sync::Mutex<Vec<Value>>,
}

fn card(base: &str) -> Value {
    // No "version": exercises the compat default
    json!({
        "name": "Mock Room Agent",
        "description": "Answers after a couple of polls",
        "url": format!("{}/api/rooms/r1/a2a", base),
        "protocolVersion": "0.3.0",
        "preferredTransport": "JSONRPC",
        "defaultInputModes": ["text/plain"],
        "defaultOutputModes": ["text/plain"],
        "capabilities": {"streaming": false},
        "skills": []
    })
}

async fn rpc(State(state): State<Arc<AgentState>>, Json(req): Json<Value>) -> Json<Value> {
    state.requests.lock().unwrap().push(req.clone());
    let id = req["id"].clone();
    let result = match req["method"].as_str().unwrap_or_default() {
        "message/send" => json!({
            "kind": "task",
            "id": "t-1",
            "contextId": "c-1",
            "status": {"state": "submitted"}
        }),
        "tasks/get" => {
            let n = state.polls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                json!({"kind": "task", "id": "t-1", "contextId": "c-1", "status": {"state": "working"}})
            } else {
                json!({
                    "kind": "task",
                    "id": "t-1",
                    "contextId": "c-1",
                    "status": {
                        "state": "input-required",
                        "message": {
                            "kind": "message",
                            "messageId": "a-1",
                            "role": "agent",
                            "parts": [{"kind": "text", "text": "Which day?"}]
                        }
                    }
                })
            }
        }
        _ => {
            return Json(json!({
                "jsonrpc": "2.0",
                "id": id,
                "error": {"code": -32601, "message": "Method not found"}
            }));
        }
    };
    Json(json!({"jsonrpc": "2.0", "id": id, "result": result}))
}

async fn spawn_agent() -> (String, Arc<AgentState>) {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let state = Arc::new(AgentState::default());

    let card_doc = card(&base);
    let app = Router::new()
        .route(
            "/api/rooms/r1/.well-known/agent-card.json",
            get(move || {
                let card_doc = card_doc.clone();
                async move { Json(card_doc) }
            }),
        )
        .route("/broken/.well-known/agent-card.json", get(|| async { "{not json" }))
        .route(
            "/missing/.well-known/agent-card.json",
            get(|| async { (StatusCode::NOT_FOUND, "no card here") }),
        )
        .route("/api/rooms/r1/a2a", post(rpc))
        .with_state(state.clone());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (base, state)
}

fn client() -> A2aClient {
    A2aClient::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_discover_validate_send_and_poll() {
    let (base, state) = spawn_agent().await;
    let c = client();

    let mut attempts = Vec::new();
    let mut doc = c
        .discover_card(&format!("{}/api/rooms/r1/a2a", base), |url| attempts.push(url.to_string()))
        .await
        .unwrap();
    assert_eq!(attempts, vec![format!("{}/api/rooms/r1/.well-known/agent-card.json", base)]);
    assert_eq!(doc.status, 200);
    assert!(doc.content_length > 0);

    apply_compat_defaults(&mut doc.body);
    let card = validate_card(&doc.body).unwrap();
    assert_eq!(card.version, "1.0.0");

    let conn = c.connect(&card, ConnectionConfig::default()).unwrap();
    let resp = conn.send_message(Message::user_text("Book a room")).await.unwrap();
    let task = match resp {
        SendMessageResponse::Task(task) => task,
        other => panic!("expected task, got {:?}", other),
    };
    assert_eq!(task.status.state, TaskState::Submitted);

    let config = PollConfig {
        interval: Duration::from_millis(10),
        ..PollConfig::default()
    };
    let outcome = poll_task(&conn, &task.id, &config, |_| {}).await;
    assert_eq!(outcome.stop, PollStop::InputRequired);
    assert_eq!(outcome.polls, 2);
    assert_eq!(outcome.last_agent_message.unwrap().text(), "Which day?");

    let requests = state.requests.lock().unwrap();
    assert_eq!(requests[0]["method"], "message/send");
    assert_eq!(requests[0]["params"]["configuration"]["blocking"], false);
    assert_eq!(requests[0]["params"]["message"]["role"], "user");
    assert_eq!(requests[1]["method"], "tasks/get");
    assert_eq!(requests[1]["params"]["historyLength"], 100);
    assert!(requests[1]["id"].as_u64().unwrap() > requests[0]["id"].as_u64().unwrap());
}

#[tokio::test]
async fn test_rpc_error_is_surfaced() {
    let (base, _state) = spawn_agent().await;
    let c = client();
    let mut doc = c
        .fetch_card_document(&format!("{}/api/rooms/r1/.well-known/agent-card.json", base))
        .await
        .unwrap();
    apply_compat_defaults(&mut doc.body);
    let card = validate_card(&doc.body).unwrap();
    let conn = c.connect(&card, ConnectionConfig::default()).unwrap();

    let err = conn.cancel_task("t-1").await.unwrap_err();
    match err {
        A2aError::Rpc { code, message } => {
            assert_eq!(code, -32601);
            assert_eq!(message, "Method not found");
        }
        other => panic!("expected Rpc error, got {}", other),
    }
}

#[tokio::test]
async fn test_fetch_reports_http_and_json_errors() {
    let (base, _state) = spawn_agent().await;
    let c = client();

    let err = c
        .fetch_card_document(&format!("{}/missing/.well-known/agent-card.json", base))
        .await
        .unwrap_err();
    match err {
        A2aError::Http { status, body, .. } => {
            assert_eq!(status, 404);
            assert_eq!(body, "no card here");
        }
        other => panic!("expected Http error, got {}", other),
    }

    let err = c
        .fetch_card_document(&format!("{}/broken/.well-known/agent-card.json", base))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::InvalidJson { .. }));
}

#[tokio::test]
async fn test_discover_card_falls_through_candidates() {
    let (base, _state) = spawn_agent().await;
    let c = client();

    let mut attempts = Vec::new();
    let err = c
        .discover_card(&format!("{}/missing", base), |url| attempts.push(url.to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::CardNotFound { .. }));
    assert_eq!(attempts, vec![format!("{}/missing/.well-known/agent-card.json", base)]);

    // "/broken/a2a" guesses "/broken/.well-known/agent-card.json" first, which
    // is not JSON, then the appended well-known path, which does not exist.
    let mut attempts = Vec::new();
    let err = c
        .discover_card(&format!("{}/broken/a2a", base), |url| attempts.push(url.to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, A2aError::CardNotFound { .. }));
    assert_eq!(attempts.len(), 2);
}
