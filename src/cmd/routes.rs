//! Route listing and resolution — `workflows routes`, `workflows resolve`.

use anyhow::{Context, Result};
use std::sync::Arc;

use workflows::router::dashboard::routes_under;
use workflows::router::{MemoryHost, ViewRouter};
use workflows::ui;

use super::load_config;
use crate::Cli;

const LOCAL_ORIGIN: &str = "http://localhost";

pub fn cmd_routes(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let table = routes_under(config.router_prefix());
    table
        .validate(Some(config.router_prefix()))
        .context("Dashboard route table is invalid")?;
    print!("{}", ui::format_routes(&table));
    Ok(())
}

pub fn cmd_resolve(cli: &Cli, path: &str) -> Result<()> {
    let config = load_config(cli)?;
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };

    let host = Arc::new(MemoryHost::new(LOCAL_ORIGIN, path.as_str()));
    let prefix = config.router_prefix();
    let router = ViewRouter::mount(host, routes_under(prefix), prefix);
    print!(
        "{}",
        ui::format_view(&router.current_path(), *router.render(), prefix)
    );
    Ok(())
}
