//! KanbanBoard end to end: REST loading and confirmation through
//! `HttpTaskApi`, live events through a real `RealtimeChannel`.

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde_json::json;
use workflows::api::HttpTaskApi;
use workflows::board::{ConnectionStatus, KanbanBoard, MoveOutcome, TaskStatus};
use workflows::realtime::{RealtimeChannel, ReconnectPolicy};

use common::{Backend, sprint_json, spawn, task_json, wait_until};

const PROJECT: i64 = 7;

fn seeded_backend() -> Arc<Backend> {
    Backend::new(
        Some(sprint_json(1, PROJECT)),
        vec![
            task_json(10, "Login form", "todo", 1),
            task_json(11, "Session refresh", "in_progress", 1),
        ],
    )
}

async fn loaded_board(backend: &Arc<Backend>) -> (KanbanBoard, std::net::SocketAddr) {
    let addr = spawn(backend.clone()).await;
    let api = HttpTaskApi::new(&format!("http://{addr}"), Some("secret".into())).unwrap();
    let board = KanbanBoard::new(PROJECT, Arc::new(api));
    board.load().await.unwrap();
    (board, addr)
}

fn status_of(board: &KanbanBoard, id: i64) -> Option<TaskStatus> {
    board.snapshot().get(id).map(|t| t.status)
}

#[tokio::test]
async fn test_load_groups_tasks_into_columns() {
    let backend = seeded_backend();
    let (board, _) = loaded_board(&backend).await;

    let columns = board.columns();
    let titles: Vec<&str> = columns.iter().map(|c| c.title).collect();
    assert_eq!(titles, ["To Do", "In Progress", "In Review", "Done"]);
    assert_eq!(columns[0].tasks[0].id, 10);
    assert_eq!(columns[1].tasks[0].id, 11);
    assert!(columns[3].tasks.is_empty());

    let auth = backend.recorded.lock().unwrap().auth_headers.clone();
    assert_eq!(auth, vec!["Bearer secret".to_string(); 2]);
}

#[tokio::test]
async fn test_project_without_sprint_loads_empty_board() {
    let backend = Backend::new(None, vec![task_json(1, "Orphan", "todo", 9)]);
    let (board, _) = loaded_board(&backend).await;
    assert!(board.snapshot().sprint().is_none());
    assert!(board.columns().iter().all(|c| c.tasks.is_empty()));
}

#[tokio::test]
async fn test_confirmed_move_takes_server_record() {
    let backend = seeded_backend();
    let (board, _) = loaded_board(&backend).await;

    let outcome = board.move_task(10, TaskStatus::Done).await;
    let MoveOutcome::Confirmed(task) = outcome else {
        panic!("expected confirmation, got {outcome:?}");
    };
    assert_eq!(task.status, TaskStatus::Done);
    let local = board.snapshot().get(10).cloned().unwrap();
    assert_eq!(local.description.as_deref(), Some("updated by server"));
    assert_eq!(backend.status_updates(), vec![(10, "done".to_string())]);
}

#[tokio::test]
async fn test_rejected_move_rolls_back_status() {
    let backend = seeded_backend();
    backend.reject_moves.store(true, Ordering::SeqCst);
    let (board, _) = loaded_board(&backend).await;

    let outcome = board.move_task(10, TaskStatus::InReview).await;
    match outcome {
        MoveOutcome::RolledBack { error } => assert!(error.contains("409")),
        other => panic!("expected rollback, got {other:?}"),
    }
    assert_eq!(status_of(&board, 10), Some(TaskStatus::Todo));
}

#[tokio::test]
async fn test_same_column_drop_makes_no_request() {
    let backend = seeded_backend();
    let (board, _) = loaded_board(&backend).await;

    assert_eq!(board.move_task(11, TaskStatus::InProgress).await, MoveOutcome::Unchanged);
    assert!(backend.status_updates().is_empty());
}

#[tokio::test]
async fn test_live_events_update_attached_board() {
    let backend = seeded_backend();
    let (board, addr) = loaded_board(&backend).await;
    let channel = RealtimeChannel::new("secret")
        .with_endpoint(format!("ws://{addr}/ws"))
        .with_policy(ReconnectPolicy {
            max_attempts: 1,
            interval: Duration::from_millis(20),
        });
    board.attach(channel);

    wait_until("project subscription", || {
        backend
            .ws_messages()
            .iter()
            .any(|m| m.contains("subscribe_project"))
    })
    .await;
    assert_eq!(board.connection_status(), ConnectionStatus::Connected);

    backend.push_event("task_status_updated", json!({ "taskId": 11, "newStatus": "in_review" }));
    backend.push_event("task_updated", json!({ "taskId": 10, "changes": { "Title": "Login page" } }));
    backend.push_event("task_created", json!({ "task": task_json(12, "Logout", "todo", 1) }));
    backend.push_event("task_created", json!({ "task": task_json(13, "Other sprint", "todo", 2) }));
    backend.push_event("task_deleted", json!({ "taskId": 11 }));

    wait_until("deletion", || status_of(&board, 11).is_none()).await;
    let snapshot = board.snapshot();
    assert_eq!(snapshot.get(10).unwrap().title, "Login page");
    assert!(snapshot.get(12).is_some());
    assert!(snapshot.get(13).is_none());

    board.detach();
    assert_eq!(board.connection_status(), ConnectionStatus::Disconnected);
    wait_until("unsubscribe", || {
        backend
            .ws_messages()
            .iter()
            .any(|m| m.contains("unsubscribe_project"))
    })
    .await;
}
