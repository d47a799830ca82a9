//! Push command - apply the migration with the Supabase CLI

use std::error::Error as _;
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::Result;
use migrun_core::{Error, LogEvent, MigrationRun};

use super::{get_context, get_logger, log_event, RunnerArgs};

pub fn run(args: RunnerArgs) -> Result<ExitCode> {
    let ctx = get_context(args)?;
    ctx.config.validate()?;

    let logger = get_logger(&ctx);
    let project_ref = ctx.config.project_ref.clone();
    let event = |name: &str| LogEvent::new(name).with_command("push").with_project(&project_ref);

    let runner = ctx.runner();
    let mut stdout = io::stdout().lock();
    let result = runner.run(&mut stdout);
    stdout.flush()?;

    let run = match result {
        Ok(run) => run,
        Err(e) => {
            log_event(&logger, failure_event(event("migration_read_failed"), &e));
            return Err(e.into());
        }
    };

    log_event(&logger, run_event(event(run.outcome.event_name()), &run));

    Ok(if run.succeeded() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Fill in the migration and error fields for a finished run
fn run_event(event: LogEvent, run: &MigrationRun) -> LogEvent {
    let mut event = event.with_migration(run.migration.clone(), run.checksum.clone());
    if let Some(message) = run.outcome.error_message() {
        event = event.with_error(message);
    }
    if let Some(details) = run.outcome.error_details() {
        event = event.with_error_details(details);
    }
    event
}

/// Record a run that stopped with an error, keeping its cause as details
fn failure_event(event: LogEvent, error: &Error) -> LogEvent {
    let event = event.with_error(error.to_string());
    match error.source() {
        Some(source) => event.with_error_details(source.to_string()),
        None => event,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use migrun_core::MigrationOutcome;
    use std::path::PathBuf;

    #[test]
    fn test_read_failure_keeps_io_cause() {
        let error = Error::Read {
            path: PathBuf::from("m.sql"),
            source: io::Error::new(io::ErrorKind::PermissionDenied, "access denied"),
        };

        let event = failure_event(LogEvent::new("migration_read_failed"), &error);
        assert!(event.error_message.unwrap().starts_with("Failed to read migration file m.sql"));
        assert_eq!(event.error_details.as_deref(), Some("access denied"));
    }

    #[test]
    fn test_invocation_failure_is_logged_with_details() {
        let run = MigrationRun {
            outcome: MigrationOutcome::InvocationFailed { message: "IO error: exec format error".into() },
            checksum: Some("abc".into()),
            migration: Some("m.sql".into()),
        };

        let event = run_event(LogEvent::new(run.outcome.event_name()), &run);
        assert_eq!(event.event, "migration_push_error");
        assert_eq!(event.migration.as_deref(), Some("m.sql"));
        assert_eq!(event.error_message.as_deref(), Some("db push could not be run"));
        assert_eq!(event.error_details.as_deref(), Some("IO error: exec format error"));
    }

    #[test]
    fn test_applied_run_has_no_error_fields() {
        let run = MigrationRun {
            outcome: MigrationOutcome::Applied { stdout: "Applied.".into() },
            checksum: Some("abc".into()),
            migration: Some("m.sql".into()),
        };

        let event = run_event(LogEvent::new("migration_applied"), &run);
        assert!(event.error_message.is_none());
        assert!(event.error_details.is_none());
    }
}
