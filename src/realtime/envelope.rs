use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::models::{Task, TaskStatus};

// ── Event names ──────────────────────────────────────────────────────

/// Emitted locally when the transport opens. Never sent by the server.
pub const CONNECTION_ESTABLISHED: &str = "connection_established";
/// Emitted locally once the reconnect ceiling is reached.
pub const CONNECTION_FAILED: &str = "connection_failed";
/// Every decoded frame is re-emitted under this name with the full envelope.
pub const MESSAGE: &str = "message";

pub const TASK_STATUS_UPDATED: &str = "task_status_updated";
pub const TASK_UPDATED: &str = "task_updated";
pub const TASK_CREATED: &str = "task_created";
pub const TASK_DELETED: &str = "task_deleted";

// ── Wire envelope ────────────────────────────────────────────────────

/// The `{type, payload}` wrapper around every realtime frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(kind: impl Into<String>, payload: Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }

    /// Decode an inbound text frame. Anything that is not a JSON object
    /// with a string `type` yields `None`.
    pub fn decode(text: &str) -> Option<Self> {
        Self::decode_raw(text).map(|(envelope, _)| envelope)
    }

    /// Like [`Envelope::decode`], also returning the frame's JSON untouched
    /// (missing `payload` stays missing, extra keys are kept).
    pub fn decode_raw(text: &str) -> Option<(Self, Value)> {
        let raw: Value = serde_json::from_str(text).ok()?;
        let envelope = Self::deserialize(&raw).ok()?;
        Some((envelope, raw))
    }
}

// ── Typed events ─────────────────────────────────────────────────────

/// Task events the Kanban board consumes. The channel routes by tag only;
/// views decode payloads into this type when they handle them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum TaskEvent {
    #[serde(rename_all = "camelCase")]
    TaskStatusUpdated {
        task_id: i64,
        new_status: TaskStatus,
    },
    #[serde(rename_all = "camelCase")]
    TaskUpdated {
        task_id: i64,
        changes: serde_json::Map<String, Value>,
    },
    TaskCreated {
        task: Task,
    },
    #[serde(rename_all = "camelCase")]
    TaskDeleted {
        task_id: i64,
    },
}

impl TaskEvent {
    /// Decode a payload that was dispatched under `kind`.
    pub fn from_payload(kind: &str, payload: &Value) -> Option<Self> {
        serde_json::from_value(serde_json::json!({ "type": kind, "payload": payload })).ok()
    }

    pub fn task_id(&self) -> i64 {
        match self {
            TaskEvent::TaskStatusUpdated { task_id, .. }
            | TaskEvent::TaskUpdated { task_id, .. }
            | TaskEvent::TaskDeleted { task_id } => *task_id,
            TaskEvent::TaskCreated { task } => task.id,
        }
    }
}

/// Client → server frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    #[serde(rename_all = "camelCase")]
    SubscribeProject { project_id: i64 },
    #[serde(rename_all = "camelCase")]
    UnsubscribeProject { project_id: i64 },
}
