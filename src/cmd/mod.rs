//! CLI command implementations.
//!
//! Each submodule owns one or more related `Commands` variants:
//!
//! | Module   | Commands handled     |
//! |----------|----------------------|
//! | `routes` | `Routes`, `Resolve`  |
//! | `board`  | `Board`, `Move`      |
//! | `config` | `Config`             |

pub mod board;
pub mod config;
pub mod routes;

pub use board::{cmd_board, cmd_move};
pub use config::cmd_config;
pub use routes::{cmd_resolve, cmd_routes};

use anyhow::Result;
use workflows::config::ClientConfig;

use crate::Cli;

/// Effective configuration for this invocation (file → env → flags).
pub(crate) fn load_config(cli: &Cli) -> Result<ClientConfig> {
    Ok(ClientConfig::load(cli.config.as_deref())?.with_cli_args(
        cli.api_base.clone(),
        cli.ws_url.clone(),
        cli.token.clone(),
    ))
}
