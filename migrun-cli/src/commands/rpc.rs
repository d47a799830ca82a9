//! RPC command - apply the migration through the execute_sql endpoint

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use migrun_core::services::write_manual_instructions;
use migrun_core::{LogEvent, MigrationRequest};

use super::{get_context, get_logger, log_event, RunnerArgs};
use crate::output;

fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

pub fn run(args: RunnerArgs, json: bool) -> Result<()> {
    let ctx = get_context(args)?;
    ctx.config.validate()?;

    let migration_path = ctx.config.migration_path()?;
    if !migration_path.exists() {
        anyhow::bail!("Migration file not found at {}", migration_path.display());
    }
    let request = MigrationRequest::load(&ctx.config.project_ref, &migration_path)
        .context("Failed to load migration")?;

    let logger = get_logger(&ctx);
    let event = |name: &str| {
        LogEvent::new(name)
            .with_command("rpc")
            .with_project(&request.project_ref)
            .with_migration(Some(request.file_name()), Some(request.checksum()))
    };

    let applier = ctx.rpc_applier()?;

    let pb = (!json).then(|| spinner(&format!("Applying {} via RPC...", request.file_name())));
    let result = applier.execute(request.sql_content());
    if let Some(pb) = pb {
        pb.finish_and_clear();
    }

    match result {
        Ok(data) => {
            log_event(&logger, event("migration_applied"));
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({"success": true, "data": data}))?
                );
            } else {
                output::success("✓ SQL migration executed successfully!");
                if !data.is_null() {
                    println!("{}", serde_json::to_string_pretty(&data)?);
                }
            }
            Ok(())
        }
        Err(e) => {
            log_event(&logger, event("migration_rpc_failed").with_error(e.to_string()));
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!({"success": false, "error": e.to_string()}))?
                );
            } else {
                output::error(&format!("Failed to run SQL migration: {}", e));
                write_manual_instructions(&mut io::stdout().lock(), request.sql_content(), &ctx.config.dashboard_url()?)?;
            }
            std::process::exit(1);
        }
    }
}
