use std::sync::{Arc, Mutex, MutexGuard, Weak};

use tokio::sync::watch;

use super::models::{ColumnView, ConnectionStatus, Task, TaskStatus};
use super::state::TaskBoard;
use crate::api::TaskApi;
use crate::errors::ApiError;
use crate::realtime::RealtimeChannel;
use crate::realtime::envelope::{
    CONNECTION_ESTABLISHED, CONNECTION_FAILED, TASK_CREATED, TASK_DELETED, TASK_STATUS_UPDATED,
    TASK_UPDATED, TaskEvent,
};

/// What became of a local move once the server answered.
#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    /// Dropped onto its own column (or unknown task): nothing happened.
    Unchanged,
    /// The server accepted the move; the local record now mirrors its reply.
    Confirmed(Task),
    /// The server rejected the move; the prior status was restored.
    RolledBack { error: String },
    /// The task was deleted while the request was in flight.
    Discarded,
}

/// Connection status plus the generation of the attached channel. Listeners
/// of a detached channel carry a stale generation and are ignored.
struct Link {
    status: ConnectionStatus,
    generation: u64,
}

struct Inner {
    board: Mutex<TaskBoard>,
    link: Mutex<Link>,
    revision: watch::Sender<u64>,
}

impl Inner {
    fn board(&self) -> MutexGuard<'_, TaskBoard> {
        self.board.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn bump(&self) {
        self.revision.send_modify(|r| *r += 1);
    }

    fn apply_event(&self, event: TaskEvent) -> bool {
        let task_id = event.task_id();
        let changed = self.board().apply_event(event);
        if changed {
            tracing::debug!(task_id, "applied remote task event");
            self.bump();
        }
        changed
    }

    fn link(&self) -> MutexGuard<'_, Link> {
        self.link.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn is_current(&self, generation: u64) -> bool {
        self.link().generation == generation
    }

    /// Start a new generation, invalidating listeners of earlier channels.
    fn next_generation(&self, status: ConnectionStatus) -> u64 {
        let mut link = self.link();
        link.generation += 1;
        link.status = status;
        link.generation
    }

    /// Record a status reported by the channel of `generation`. Returns
    /// `false` when that channel has since been detached.
    fn set_connection(&self, generation: u64, status: ConnectionStatus) -> bool {
        {
            let mut link = self.link();
            if link.generation != generation {
                return false;
            }
            link.status = status;
        }
        self.bump();
        true
    }
}

/// Kanban view controller: owns the board state for one project, merges
/// realtime events into it and performs optimistic moves against the REST
/// collaborator.
///
/// The realtime channel is scoped to the controller: `detach()` (or drop)
/// disconnects it.
pub struct KanbanBoard {
    project_id: i64,
    api: Arc<dyn TaskApi>,
    inner: Arc<Inner>,
    channel: Mutex<Option<Arc<RealtimeChannel>>>,
}

impl KanbanBoard {
    pub fn new(project_id: i64, api: Arc<dyn TaskApi>) -> Self {
        Self::with_board(project_id, api, TaskBoard::new())
    }

    pub fn with_board(project_id: i64, api: Arc<dyn TaskApi>, board: TaskBoard) -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            project_id,
            api,
            inner: Arc::new(Inner {
                board: Mutex::new(board),
                link: Mutex::new(Link {
                    status: ConnectionStatus::Disconnected,
                    generation: 0,
                }),
                revision,
            }),
            channel: Mutex::new(None),
        }
    }

    pub fn project_id(&self) -> i64 {
        self.project_id
    }

    /// Fetch the active sprint and its tasks. A project without an active
    /// sprint yields an empty board.
    pub async fn load(&self) -> Result<(), ApiError> {
        let sprint = self.api.active_sprint(self.project_id).await?;
        let tasks = match &sprint {
            Some(s) => self.api.sprint_tasks(s.id).await?,
            None => Vec::new(),
        };
        tracing::info!(
            project_id = self.project_id,
            sprint = sprint.as_ref().map(|s| s.id),
            tasks = tasks.len(),
            "board loaded"
        );
        self.inner.board().reset(sprint, tasks);
        self.inner.bump();
        Ok(())
    }

    pub fn snapshot(&self) -> TaskBoard {
        self.inner.board().clone()
    }

    pub fn columns(&self) -> Vec<ColumnView> {
        self.inner.board().columns()
    }

    pub fn connection_status(&self) -> ConnectionStatus {
        self.inner.link().status
    }

    /// Receiver that ticks whenever the board or connection status changes.
    pub fn watch_changes(&self) -> watch::Receiver<u64> {
        self.inner.revision.subscribe()
    }

    /// Merge a remote event into the board.
    pub fn apply_event(&self, event: TaskEvent) -> bool {
        self.inner.apply_event(event)
    }

    /// Wire a realtime channel into the board and connect it. Any channel
    /// attached earlier is disconnected first.
    pub fn attach(&self, channel: RealtimeChannel) {
        self.detach();
        let channel = Arc::new(channel);
        let generation = self.inner.next_generation(ConnectionStatus::Disconnected);

        for kind in [TASK_STATUS_UPDATED, TASK_UPDATED, TASK_CREATED, TASK_DELETED] {
            let inner = Arc::clone(&self.inner);
            channel.on(kind, move |payload| {
                if !inner.is_current(generation) {
                    return;
                }
                match TaskEvent::from_payload(kind, payload) {
                    Some(event) => {
                        inner.apply_event(event);
                    }
                    None => tracing::debug!(kind, "ignoring task event with unexpected payload"),
                }
            });
        }

        let inner = Arc::clone(&self.inner);
        let weak: Weak<RealtimeChannel> = Arc::downgrade(&channel);
        let project_id = self.project_id;
        channel.on(CONNECTION_ESTABLISHED, move |_| {
            if !inner.set_connection(generation, ConnectionStatus::Connected) {
                return;
            }
            if let Some(ch) = weak.upgrade() {
                ch.subscribe_project(project_id);
            }
        });

        let inner = Arc::clone(&self.inner);
        channel.on(CONNECTION_FAILED, move |_| {
            inner.set_connection(generation, ConnectionStatus::Failed);
        });

        channel.connect();
        *self.channel.lock().unwrap_or_else(|e| e.into_inner()) = Some(channel);
    }

    /// Unsubscribe from the project and tear the channel down.
    pub fn detach(&self) {
        let channel = self
            .channel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(channel) = channel {
            self.inner.next_generation(ConnectionStatus::Disconnected);
            self.inner.bump();
            channel.unsubscribe_project(self.project_id);
            channel.disconnect();
        }
    }

    /// Move a task to `target`: write locally first, then confirm with the
    /// server and reconcile with its answer.
    pub async fn move_task(&self, task_id: i64, target: TaskStatus) -> MoveOutcome {
        let pending = self.inner.board().begin_move(task_id, target);
        let Some(pending) = pending else {
            return MoveOutcome::Unchanged;
        };
        self.inner.bump();
        tracing::debug!(task_id, from = %pending.prior_status, to = %target, "optimistic move");

        match self.api.update_task_status(task_id, target).await {
            Ok(confirmed) => {
                let applied = self.inner.board().confirm_move(&pending, confirmed.clone());
                if !applied {
                    tracing::debug!(task_id, "confirmation for deleted task discarded");
                    return MoveOutcome::Discarded;
                }
                self.inner.bump();
                MoveOutcome::Confirmed(confirmed)
            }
            Err(e) => {
                let restored = self.inner.board().rollback_move(&pending);
                if !restored {
                    return MoveOutcome::Discarded;
                }
                tracing::warn!(task_id, error = %e, "task move rejected, rolled back");
                self.inner.bump();
                MoveOutcome::RolledBack {
                    error: e.to_string(),
                }
            }
        }
    }
}

impl Drop for KanbanBoard {
    fn drop(&mut self) {
        self.detach();
    }
}
