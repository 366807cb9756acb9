//! In-process stand-in for the WorkflowS backend: the three REST endpoints
//! the board uses and the realtime WebSocket.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::broadcast;

/// What the server pushes to every open socket.
#[derive(Debug, Clone)]
pub enum Push {
    Text(String),
    Close,
}

#[derive(Default)]
pub struct Recorded {
    pub auth_headers: Vec<String>,
    pub status_updates: Vec<(i64, String)>,
    pub ws_tokens: Vec<String>,
    pub ws_messages: Vec<String>,
}

pub struct Backend {
    pub sprint: Mutex<Option<Value>>,
    pub tasks: Mutex<Vec<Value>>,
    pub reject_moves: AtomicBool,
    pub ws_connections: AtomicUsize,
    pub ws_closed: AtomicUsize,
    pub recorded: Mutex<Recorded>,
    push: broadcast::Sender<Push>,
}

impl Backend {
    pub fn new(sprint: Option<Value>, tasks: Vec<Value>) -> Arc<Self> {
        let (push, _) = broadcast::channel(64);
        Arc::new(Self {
            sprint: Mutex::new(sprint),
            tasks: Mutex::new(tasks),
            reject_moves: AtomicBool::new(false),
            ws_connections: AtomicUsize::new(0),
            ws_closed: AtomicUsize::new(0),
            recorded: Mutex::new(Recorded::default()),
            push,
        })
    }

    /// Send a `{type, payload}` frame to every connected socket.
    pub fn push_event(&self, kind: &str, payload: Value) {
        let _ = self
            .push
            .send(Push::Text(json!({ "type": kind, "payload": payload }).to_string()));
    }

    pub fn push_raw(&self, text: &str) {
        let _ = self.push.send(Push::Text(text.to_string()));
    }

    /// Drop every open socket from the server side.
    pub fn kick_all(&self) {
        let _ = self.push.send(Push::Close);
    }

    pub fn ws_messages(&self) -> Vec<String> {
        self.recorded.lock().unwrap().ws_messages.clone()
    }

    pub fn status_updates(&self) -> Vec<(i64, String)> {
        self.recorded.lock().unwrap().status_updates.clone()
    }
}

pub fn sprint_json(id: i64, project_id: i64) -> Value {
    json!({ "ID": id, "Name": format!("Sprint {id}"), "Status": "active", "ProjectID": project_id })
}

pub fn task_json(id: i64, title: &str, status: &str, sprint_id: i64) -> Value {
    json!({ "ID": id, "Title": title, "Status": status, "SprintID": sprint_id })
}

fn record_auth(backend: &Backend, headers: &HeaderMap) {
    if let Some(value) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        backend.recorded.lock().unwrap().auth_headers.push(value.to_string());
    }
}

async fn active_sprint(
    State(backend): State<Arc<Backend>>,
    Path(_project_id): Path<i64>,
    headers: HeaderMap,
) -> Response {
    record_auth(&backend, &headers);
    match backend.sprint.lock().unwrap().clone() {
        Some(sprint) => Json(sprint).into_response(),
        None => (StatusCode::NOT_FOUND, "no active sprint").into_response(),
    }
}

async fn sprint_tasks(
    State(backend): State<Arc<Backend>>,
    Path(_sprint_id): Path<i64>,
    headers: HeaderMap,
) -> Json<Vec<Value>> {
    record_auth(&backend, &headers);
    Json(backend.tasks.lock().unwrap().clone())
}

async fn update_status(
    State(backend): State<Arc<Backend>>,
    Path(task_id): Path<i64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    record_auth(&backend, &headers);
    let status = body["status"].as_str().unwrap_or_default().to_string();
    backend
        .recorded
        .lock()
        .unwrap()
        .status_updates
        .push((task_id, status.clone()));

    if backend.reject_moves.load(Ordering::SeqCst) {
        return (StatusCode::CONFLICT, "task locked").into_response();
    }
    let mut tasks = backend.tasks.lock().unwrap();
    match tasks.iter_mut().find(|t| t["ID"] == task_id) {
        Some(task) => {
            task["Status"] = Value::String(status);
            task["Description"] = Value::String("updated by server".into());
            Json(task.clone()).into_response()
        }
        None => (StatusCode::NOT_FOUND, "no such task").into_response(),
    }
}

async fn realtime(
    State(backend): State<Arc<Backend>>,
    Query(params): Query<HashMap<String, String>>,
    ws: WebSocketUpgrade,
) -> Response {
    // Subscribe before answering the upgrade so pushes sent right after the
    // client sees `Open` are not missed.
    let rx = backend.push.subscribe();
    backend
        .recorded
        .lock()
        .unwrap()
        .ws_tokens
        .push(params.get("token").cloned().unwrap_or_default());
    backend.ws_connections.fetch_add(1, Ordering::SeqCst);
    ws.on_upgrade(move |socket| serve_socket(socket, rx, backend))
}

async fn serve_socket(mut socket: WebSocket, mut rx: broadcast::Receiver<Push>, backend: Arc<Backend>) {
    loop {
        tokio::select! {
            inbound = socket.recv() => match inbound {
                Some(Ok(Message::Text(text))) => {
                    backend.recorded.lock().unwrap().ws_messages.push(text.to_string());
                }
                Some(Ok(Message::Close(_))) | None | Some(Err(_)) => break,
                Some(Ok(_)) => {}
            },
            push = rx.recv() => match push {
                Ok(Push::Text(text)) => {
                    if socket.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Ok(Push::Close) | Err(_) => break,
            },
        }
    }
    backend.ws_closed.fetch_add(1, Ordering::SeqCst);
}

/// Bind on an ephemeral port and serve in the background.
pub async fn spawn(backend: Arc<Backend>) -> SocketAddr {
    let app = Router::new()
        .route("/api/projects/{id}/active-sprint", get(active_sprint))
        .route("/api/sprints/{id}/tasks", get(sprint_tasks))
        .route("/api/tasks/{id}/status", put(update_status))
        .route("/ws", get(realtime))
        .with_state(backend);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Poll `cond` until it holds, failing the test after five seconds.
pub async fn wait_until(what: &str, cond: impl Fn() -> bool) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while !cond() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}
