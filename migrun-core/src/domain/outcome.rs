//! Outcome of one migration run

use std::path::PathBuf;

use serde::Serialize;

/// How a migration run ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MigrationOutcome {
    /// The push exited 0
    Applied { stdout: String },
    /// The database CLI could not be found or failed its version probe
    ToolMissing,
    /// The migration file does not exist at the resolved path
    FileMissing { path: PathBuf },
    /// The push exited non-zero
    PushRejected { code: Option<i32>, stderr: String },
    /// The push did not finish before the timeout
    TimedOut,
    /// The push could not be launched or waited on
    InvocationFailed { message: String },
}

impl MigrationOutcome {
    pub fn succeeded(&self) -> bool {
        matches!(self, MigrationOutcome::Applied { .. })
    }

    /// Whether the manual instructions are printed for this outcome
    ///
    /// Timeouts are excluded unless the caller opts in.
    pub fn needs_manual_fallback(&self, fallback_on_timeout: bool) -> bool {
        match self {
            MigrationOutcome::PushRejected { .. } | MigrationOutcome::InvocationFailed { .. } => true,
            MigrationOutcome::TimedOut => fallback_on_timeout,
            _ => false,
        }
    }

    /// Short event name for the event log
    pub fn event_name(&self) -> &'static str {
        match self {
            MigrationOutcome::Applied { .. } => "migration_applied",
            MigrationOutcome::ToolMissing => "cli_missing",
            MigrationOutcome::FileMissing { .. } => "migration_file_missing",
            MigrationOutcome::PushRejected { .. } => "migration_push_failed",
            MigrationOutcome::TimedOut => "migration_push_timed_out",
            MigrationOutcome::InvocationFailed { .. } => "migration_push_error",
        }
    }

    /// Error text worth logging, if any
    pub fn error_message(&self) -> Option<String> {
        match self {
            MigrationOutcome::Applied { .. } => None,
            MigrationOutcome::ToolMissing => Some("Supabase CLI is not installed".to_string()),
            MigrationOutcome::FileMissing { path } => {
                Some(format!("Migration file not found at {}", path.display()))
            }
            MigrationOutcome::PushRejected { code, .. } => Some(match code {
                Some(c) => format!("db push exited with status {}", c),
                None => "db push was terminated by a signal".to_string(),
            }),
            MigrationOutcome::TimedOut => Some("Command timed out".to_string()),
            MigrationOutcome::InvocationFailed { .. } => Some("db push could not be run".to_string()),
        }
    }

    /// Underlying cause behind `error_message`, if there is one
    ///
    /// CLI output is left out; only the invocation error is kept.
    pub fn error_details(&self) -> Option<String> {
        match self {
            MigrationOutcome::InvocationFailed { message } => Some(message.clone()),
            _ => None,
        }
    }
}
