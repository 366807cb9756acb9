//! Kanban commands — `workflows board`, `workflows move`.

use anyhow::{Context, Result, bail};
use std::sync::Arc;

use workflows::api::HttpTaskApi;
use workflows::board::{ConnectionStatus, KanbanBoard, MoveOutcome, TaskStatus};
use workflows::config::ClientConfig;
use workflows::realtime::RealtimeChannel;
use workflows::ui;

use super::load_config;
use crate::Cli;

async fn load_board(config: &ClientConfig, project: i64) -> Result<KanbanBoard> {
    let api = HttpTaskApi::new(&config.api_base, config.token.clone())?;
    let board = KanbanBoard::new(project, Arc::new(api));
    board
        .load()
        .await
        .with_context(|| format!("Failed to load board for project {project}"))?;
    Ok(board)
}

fn print_board(board: &KanbanBoard) {
    let snapshot = board.snapshot();
    print!(
        "{}",
        ui::format_board(snapshot.sprint(), &snapshot.columns(), board.connection_status())
    );
}

pub async fn cmd_board(cli: &Cli, project: i64, watch: bool) -> Result<()> {
    let config = load_config(cli)?;
    let board = load_board(&config, project).await?;

    if !watch {
        print_board(&board);
        return Ok(());
    }

    let token = config.require_token()?;
    let channel = RealtimeChannel::new(token)
        .with_endpoint(config.ws_url.clone())
        .with_policy(config.reconnect_policy());
    let mut changes = board.watch_changes();
    board.attach(channel);
    print_board(&board);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing realtime channel");
                break;
            }
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                println!();
                print_board(&board);
                if board.connection_status() == ConnectionStatus::Failed {
                    bail!("Realtime connection failed after retrying");
                }
            }
        }
    }

    board.detach();
    Ok(())
}

pub async fn cmd_move(cli: &Cli, project: i64, task_id: i64, status: TaskStatus) -> Result<()> {
    let config = load_config(cli)?;
    let board = load_board(&config, project).await?;

    if board.snapshot().get(task_id).is_none() {
        bail!("Task #{task_id} is not on the active sprint board of project {project}");
    }

    let outcome = board.move_task(task_id, status).await;
    println!("{}", ui::format_move_outcome(task_id, &outcome));
    match outcome {
        MoveOutcome::RolledBack { .. } => bail!("Server rejected the move"),
        _ => Ok(()),
    }
}
