//! Kanban board — task state, remote-event merging and optimistic moves.
//!
//! ## Move protocol
//!
//! ```text
//!   drag task T to S
//!     │
//!     ├─ T.status == S ──────────────> Unchanged (no write, no request)
//!     │
//!     ├─ write T.status = S locally (before any await)
//!     │
//!     └─ PUT /api/tasks/{T}/status
//!           ├─ ok(task)  ──> replace T with server record   (if T still exists)
//!           └─ error     ──> restore prior status only      (if T still exists)
//! ```
//!
//! Remote events are merged per task; a `task_deleted` always wins over a
//! confirmation still in flight.

pub mod kanban;
pub mod models;
pub mod state;

pub use kanban::{KanbanBoard, MoveOutcome};
pub use models::{ConnectionStatus, Sprint, Task, TaskStatus};
pub use state::{PendingMove, TaskBoard};
