use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use workflows::board::TaskStatus;

mod cmd;

#[derive(Parser)]
#[command(name = "workflows")]
#[command(version, about = "WorkflowS dashboard client: routes, live Kanban board and task moves")]
pub struct Cli {
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    /// Path to workflows.toml (defaults to ./workflows.toml, then the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// REST API base URL. Overrides WORKFLOWS_API_BASE and the config file.
    #[arg(long, global = true)]
    pub api_base: Option<String>,

    /// Realtime WebSocket URL. Overrides WORKFLOWS_WS_URL and the config file.
    #[arg(long, global = true)]
    pub ws_url: Option<String>,

    /// Bearer token. Overrides WORKFLOWS_TOKEN.
    #[arg(long, global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the dashboard routes
    Routes,
    /// Show which view a path resolves to
    Resolve {
        /// Path to resolve, e.g. /dashboard/projects/42
        path: String,
    },
    /// Show the active sprint board for a project
    Board {
        #[arg(short, long)]
        project: i64,

        /// Stay connected and redraw on realtime task events
        #[arg(short, long)]
        watch: bool,
    },
    /// Move a task to another column
    Move {
        #[arg(short, long)]
        project: i64,

        task_id: i64,

        /// Target status: todo, in_progress, in_review, done
        status: TaskStatus,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a default workflows.toml in the current directory
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    workflows::logging::init(cli.verbose, cli.log_json)?;

    match &cli.command {
        Commands::Routes => cmd::cmd_routes(&cli)?,
        Commands::Resolve { path } => cmd::cmd_resolve(&cli, path)?,
        Commands::Board { project, watch } => cmd::cmd_board(&cli, *project, *watch).await?,
        Commands::Move {
            project,
            task_id,
            status,
        } => cmd::cmd_move(&cli, *project, *task_id, *status).await?,
        Commands::Config { command } => cmd::cmd_config(&cli, command.clone())?,
    }

    Ok(())
}
