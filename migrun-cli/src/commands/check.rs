//! Check command - pre-flight checks before a push

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, Color};
use migrun_core::services::CheckService;
use migrun_core::LogEvent;

use super::{get_context, get_logger, log_event, RunnerArgs};
use crate::output;

pub fn run(args: RunnerArgs, json: bool) -> Result<()> {
    let ctx = get_context(args)?;
    let cli = ctx.database_cli();
    let report = CheckService::new(&cli, &ctx.config).run_checks();

    let mut event = LogEvent::new("checks_completed")
        .with_command("check")
        .with_project(&ctx.config.project_ref);
    if report.summary.errors > 0 {
        event = event.with_error(format!("{} check(s) failed", report.summary.errors));
    }
    log_event(&get_logger(&ctx), event);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", "Migration Pre-flight Check".bold());
        println!();

        let mut table = output::create_table();
        table.set_header(vec!["Check", "Status", "Message"]);

        for (name, check) in &report.checks {
            let status_cell = match check.status.as_str() {
                "pass" => Cell::new("PASS").fg(Color::Green),
                "warning" => Cell::new("WARN").fg(Color::Yellow),
                "error" => Cell::new("ERROR").fg(Color::Red),
                _ => Cell::new(&check.status),
            };
            table.add_row(vec![Cell::new(name), status_cell, Cell::new(&check.message)]);

            for detail in check.details.iter().flatten() {
                if let Some(map) = detail.as_object() {
                    let formatted = map
                        .iter()
                        .map(|(k, v)| format!("{}: {}", k, v.as_str().map(str::to_string).unwrap_or_else(|| v.to_string())))
                        .collect::<Vec<_>>()
                        .join(", ");
                    table.add_row(vec![Cell::new(""), Cell::new(""), Cell::new(format!("  - {}", formatted))]);
                }
            }
        }

        println!("{}", table);
        println!();
        println!(
            "Summary: {} passed, {} warnings, {} errors",
            report.summary.passed.to_string().green(),
            report.summary.warnings.to_string().yellow(),
            report.summary.errors.to_string().red(),
        );
    }

    if report.summary.errors > 0 {
        std::process::exit(1);
    }

    Ok(())
}
