//! Terminal rendering of the Kanban board.
//!
//! The `format_*` functions return plain strings (styling is dropped when
//! the terminal does not support it) so they can be asserted on directly.

use console::style;

use super::icons::{BROKEN, CHECK, COLUMN, CROSS, LIVE, OFFLINE, PERSON, UNDO};
use crate::board::models::{ColumnView, Task};
use crate::board::{ConnectionStatus, MoveOutcome, Sprint};

pub fn format_connection(status: ConnectionStatus) -> String {
    match status {
        ConnectionStatus::Connected => format!("{}{}", LIVE, style("Live").green()),
        ConnectionStatus::Disconnected => format!("{}{}", OFFLINE, style("Disconnected").dim()),
        ConnectionStatus::Failed => format!("{}{}", BROKEN, style("Connection failed").red()),
    }
}

fn format_task(task: &Task) -> String {
    let mut line = format!("  {} {}", style(format!("#{}", task.id)).dim(), task.title);
    if let Some(story) = &task.user_story {
        line.push_str(&format!(" {}", style(format!("[{}]", story.title)).cyan()));
    }
    if let Some(name) = task.assigned_to.as_ref().and_then(|u| u.nombre.as_deref()) {
        line.push_str(&format!(" {}{}", PERSON, name));
    }
    line
}

/// Header line, then one block per column in fixed column order.
pub fn format_board(sprint: Option<&Sprint>, columns: &[ColumnView], status: ConnectionStatus) -> String {
    let mut out = String::new();
    match sprint {
        Some(sprint) => out.push_str(&format!(
            "{} {}  {}\n",
            style(&sprint.name).bold(),
            style(format!("({})", sprint.status)).dim(),
            format_connection(status)
        )),
        None => {
            out.push_str(&format!("{}\n", style("No active sprint").yellow()));
            return out;
        }
    }

    for column in columns {
        out.push_str(&format!(
            "\n{}{} {}\n",
            COLUMN,
            style(column.title).bold(),
            style(format!("({})", column.tasks.len())).dim()
        ));
        if column.tasks.is_empty() {
            out.push_str(&format!("  {}\n", style("—").dim()));
        }
        for task in &column.tasks {
            out.push_str(&format_task(task));
            out.push('\n');
        }
    }
    out
}

pub fn format_move_outcome(task_id: i64, outcome: &MoveOutcome) -> String {
    match outcome {
        MoveOutcome::Unchanged => format!("Task #{task_id} already has that status"),
        MoveOutcome::Confirmed(task) => {
            format!("{}Task #{} moved to {}", CHECK, task.id, task.status.title())
        }
        MoveOutcome::RolledBack { error } => {
            format!("{}Move of task #{task_id} rejected, rolled back: {error}", UNDO)
        }
        MoveOutcome::Discarded => {
            format!("{}Task #{task_id} was deleted before the move was confirmed", CROSS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::models::UserRef;
    use crate::board::{TaskBoard, TaskStatus};

    fn task(id: i64, title: &str, status: TaskStatus) -> Task {
        Task {
            id,
            title: title.to_string(),
            description: None,
            status,
            user_story: None,
            assigned_to: None,
            sprint_id: Some(1),
        }
    }

    fn sprint() -> Sprint {
        Sprint {
            id: 1,
            name: "Sprint 1".into(),
            status: "active".into(),
            project_id: Some(7),
        }
    }

    #[test]
    fn test_board_lists_columns_in_order_with_counts() {
        console::set_colors_enabled(false);
        let mut assigned = task(2, "Write docs", TaskStatus::Done);
        assigned.assigned_to = Some(UserRef {
            id: 3,
            nombre: Some("Ana".into()),
        });
        let board = TaskBoard::with_tasks(Some(sprint()), vec![task(1, "Login form", TaskStatus::Todo), assigned]);

        let text = format_board(board.sprint(), &board.columns(), ConnectionStatus::Connected);
        let todo = text.find("To Do (1)").unwrap();
        let progress = text.find("In Progress (0)").unwrap();
        let done = text.find("Done (1)").unwrap();
        assert!(todo < progress && progress < done);
        assert!(text.contains("#1 Login form"));
        assert!(text.contains("Ana"));
        assert!(text.contains("Live"));
    }

    #[test]
    fn test_board_without_sprint() {
        console::set_colors_enabled(false);
        let text = format_board(None, &[], ConnectionStatus::Disconnected);
        assert_eq!(text.trim(), "No active sprint");
    }

    #[test]
    fn test_move_outcome_messages() {
        let rolled = format_move_outcome(4, &MoveOutcome::RolledBack { error: "409".into() });
        assert!(rolled.contains("#4"));
        assert!(rolled.contains("rolled back"));
        assert!(format_move_outcome(4, &MoveOutcome::Unchanged).contains("already"));
        assert!(format_move_outcome(4, &MoveOutcome::Discarded).contains("deleted"));
    }
}
