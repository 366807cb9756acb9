use serde_json::Value;

use super::models::{ColumnView, Sprint, Task, TaskStatus};
use crate::realtime::envelope::TaskEvent;

/// A local move that has been applied optimistically and is waiting for
/// the server to confirm it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingMove {
    pub task_id: i64,
    pub prior_status: TaskStatus,
    pub target_status: TaskStatus,
}

/// In-memory task list held by the Kanban view.
///
/// Writes come from two places: optimistic local moves (`begin_move` then
/// `confirm_move` or `rollback_move`) and remote events (`apply_event`).
/// Every write is per-task and guarded against the task having been
/// removed in the meantime.
#[derive(Debug, Clone, Default)]
pub struct TaskBoard {
    sprint: Option<Sprint>,
    tasks: Vec<Task>,
}

impl TaskBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(sprint: Option<Sprint>, tasks: Vec<Task>) -> Self {
        Self { sprint, tasks }
    }

    /// Replace the whole board after a fresh load.
    pub fn reset(&mut self, sprint: Option<Sprint>, tasks: Vec<Task>) {
        self.sprint = sprint;
        self.tasks = tasks;
    }

    pub fn sprint(&self) -> Option<&Sprint> {
        self.sprint.as_ref()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: i64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    fn get_mut(&mut self, task_id: i64) -> Option<&mut Task> {
        self.tasks.iter_mut().find(|t| t.id == task_id)
    }

    /// Tasks grouped into the fixed column set, in board order.
    pub fn columns(&self) -> Vec<ColumnView> {
        TaskStatus::ALL
            .iter()
            .map(|&status| ColumnView {
                status,
                title: status.title(),
                tasks: self
                    .tasks
                    .iter()
                    .filter(|t| t.status == status)
                    .cloned()
                    .collect(),
            })
            .collect()
    }

    // ── Optimistic moves ─────────────────────────────────────────────

    /// Apply a move locally. Returns `None`, touching nothing, when the task
    /// is unknown or already in `target`.
    pub fn begin_move(&mut self, task_id: i64, target: TaskStatus) -> Option<PendingMove> {
        let task = self.get_mut(task_id)?;
        if task.status == target {
            return None;
        }
        let pending = PendingMove {
            task_id,
            prior_status: task.status,
            target_status: target,
        };
        task.status = target;
        Some(pending)
    }

    /// Adopt the server's representation. Returns `false` when the task
    /// was removed while the request was in flight.
    pub fn confirm_move(&mut self, pending: &PendingMove, confirmed: Task) -> bool {
        match self.get_mut(pending.task_id) {
            Some(task) => {
                *task = confirmed;
                true
            }
            None => false,
        }
    }

    /// Restore the status this move overwrote, leaving every other field
    /// alone. Returns `false` when the task no longer exists.
    pub fn rollback_move(&mut self, pending: &PendingMove) -> bool {
        match self.get_mut(pending.task_id) {
            Some(task) => {
                task.status = pending.prior_status;
                true
            }
            None => false,
        }
    }

    // ── Remote events ────────────────────────────────────────────────

    /// Merge a remote event. Returns whether the board changed.
    pub fn apply_event(&mut self, event: TaskEvent) -> bool {
        match event {
            TaskEvent::TaskStatusUpdated {
                task_id,
                new_status,
            } => match self.get_mut(task_id) {
                Some(task) if task.status != new_status => {
                    task.status = new_status;
                    true
                }
                _ => false,
            },
            TaskEvent::TaskUpdated { task_id, changes } => self.merge_changes(task_id, changes),
            TaskEvent::TaskCreated { task } => self.insert_created(task),
            TaskEvent::TaskDeleted { task_id } => {
                let before = self.tasks.len();
                self.tasks.retain(|t| t.id != task_id);
                self.tasks.len() != before
            }
        }
    }

    fn merge_changes(&mut self, task_id: i64, changes: serde_json::Map<String, Value>) -> bool {
        let Some(task) = self.get_mut(task_id) else {
            return false;
        };
        let mut merged = match serde_json::to_value(&*task) {
            Ok(Value::Object(map)) => map,
            _ => return false,
        };
        for (key, value) in changes {
            // The record's identity is not a mergeable field.
            if key == "ID" {
                continue;
            }
            merged.insert(key, value);
        }
        match serde_json::from_value::<Task>(Value::Object(merged)) {
            Ok(updated) => {
                let changed = updated != *task;
                *task = updated;
                changed
            }
            Err(e) => {
                tracing::debug!(task_id, error = %e, "ignoring task_updated with invalid changes");
                false
            }
        }
    }

    /// Created tasks only join the board while a sprint is displayed and the
    /// task is not explicitly bound to another sprint. A known id replaces
    /// the existing record instead of duplicating it.
    fn insert_created(&mut self, task: Task) -> bool {
        let Some(sprint) = &self.sprint else {
            return false;
        };
        if task.sprint_id.is_some_and(|id| id != sprint.id) {
            return false;
        }
        match self.get_mut(task.id) {
            Some(existing) => *existing = task,
            None => self.tasks.push(task),
        }
        true
    }
}
