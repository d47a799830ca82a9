//! Config command - show or persist runner settings

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::{get_context, RunnerArgs};
use crate::output;

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show {
        #[command(flatten)]
        runner: RunnerArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Save the effective configuration (with any flags) to settings.json
    Save {
        #[command(flatten)]
        runner: RunnerArgs,
    },
}

pub fn run(command: ConfigCommands) -> Result<()> {
    match command {
        ConfigCommands::Show { runner, json } => {
            let ctx = get_context(runner)?;
            let config = &ctx.config;
            let migration_path = config.migration_path()?;

            if json {
                let mut value = serde_json::to_value(config)?;
                value["migrationPath"] = serde_json::json!(migration_path);
                value["stateDir"] = serde_json::json!(ctx.state_dir);
                println!("{}", serde_json::to_string_pretty(&value)?);
                return Ok(());
            }

            println!("{}", "Configuration".bold());
            let mut table = output::create_table();
            table.add_row(vec!["Project ref".to_string(), config.project_ref.clone()]);
            table.add_row(vec!["Migration".to_string(), migration_path.display().to_string()]);
            table.add_row(vec!["CLI program".to_string(), config.cli_program.clone()]);
            table.add_row(vec!["Push timeout".to_string(), format!("{}s", config.push_timeout_secs)]);
            table.add_row(vec![
                "Fallback on timeout".to_string(),
                config.fallback_on_timeout.to_string(),
            ]);
            table.add_row(vec!["Dashboard".to_string(), config.dashboard_url()?]);
            table.add_row(vec!["RPC endpoint".to_string(), config.supabase_url()]);
            table.add_row(vec!["State directory".to_string(), ctx.state_dir.display().to_string()]);
            println!("{}", table);

            if let Err(e) = config.validate() {
                output::warning(&e.to_string());
            }
        }
        ConfigCommands::Save { runner } => {
            let ctx = get_context(runner)?;
            ctx.config.validate()?;
            ctx.config.save(&ctx.state_dir)?;
            output::success(&format!(
                "Saved settings to {}",
                ctx.state_dir.join("settings.json").display()
            ));
        }
    }

    Ok(())
}
