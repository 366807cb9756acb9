//! Configuration view and validation commands — `workflows config`.

use anyhow::{Context, Result, bail};
use console::style;
use std::path::PathBuf;

use workflows::config::{CONFIG_FILE_NAME, ENV_TOKEN, WorkflowsToml};
use workflows::ui::icons::{CHECK, CROSS};

use super::super::ConfigCommands;
use super::load_config;
use crate::Cli;

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    match command {
        None | Some(ConfigCommands::Show) => {
            let config = load_config(cli)?;

            println!();
            println!("WorkflowS Configuration");
            println!("=======================");
            println!();
            match &config.source {
                Some(path) => println!("Config file: {}", path.display()),
                None => println!("Config file: {}", style("none (using defaults)").dim()),
            }
            println!();

            println!("[api]");
            println!("  base_url = \"{}\"", config.api_base);
            println!();
            println!("[realtime]");
            println!("  url = \"{}\"", config.ws_url);
            println!(
                "  max_reconnect_attempts = {}",
                config.toml.realtime.max_reconnect_attempts
            );
            println!(
                "  reconnect_interval_ms = {}",
                config.toml.realtime.reconnect_interval_ms
            );
            println!();
            println!("[router]");
            println!("  prefix = \"{}\"", config.router_prefix());
            println!();
            let token = if config.token.is_some() {
                style("set").green()
            } else {
                style("not set").yellow()
            };
            println!("{}: {}", ENV_TOKEN, token);
        }
        Some(ConfigCommands::Validate) => {
            let config = load_config(cli)?;
            let warnings = config.validate();
            if warnings.is_empty() {
                println!("{}Configuration is valid", CHECK);
            } else {
                for warning in &warnings {
                    println!("{}{}", CROSS, warning);
                }
                bail!("{} configuration warning(s)", warnings.len());
            }
        }
        Some(ConfigCommands::Init { force }) => {
            let path = cli
                .config
                .clone()
                .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
            if path.exists() && !force {
                bail!(
                    "{} already exists. Use --force to overwrite.",
                    path.display()
                );
            }
            let content = WorkflowsToml::default().to_toml_string()?;
            std::fs::write(&path, content)
                .with_context(|| format!("Failed to write config file: {}", path.display()))?;
            println!("{}Wrote {}", CHECK, path.display());
        }
    }

    Ok(())
}
