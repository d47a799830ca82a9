//! Migration runner - pushes one SQL file through the database CLI
//!
//! The run is a fixed sequence: probe the CLI, resolve and load the file,
//! echo it, push it, and print manual dashboard instructions when the push
//! fails. Everything is written to the supplied writer so the CLI can hand
//! in stdout and tests can hand in a buffer.

use std::io::Write;

use serde::Serialize;

use crate::config::RunnerConfig;
use crate::domain::result::Result;
use crate::domain::{MigrationOutcome, MigrationRequest};
use crate::ports::{DatabaseCli, PushOutput};

const SEPARATOR_WIDTH: usize = 60;

fn separator() -> String {
    "=".repeat(SEPARATOR_WIDTH)
}

/// Result of a run along with what was pushed
#[derive(Debug, Clone, Serialize)]
pub struct MigrationRun {
    pub outcome: MigrationOutcome,
    /// SHA-256 of the SQL, present once the file was loaded
    pub checksum: Option<String>,
    pub migration: Option<String>,
}

impl MigrationRun {
    pub fn succeeded(&self) -> bool {
        self.outcome.succeeded()
    }
}

/// Print the dashboard walkthrough for applying `sql` by hand
pub fn write_manual_instructions<W: Write>(out: &mut W, sql: &str, dashboard_url: &str) -> Result<()> {
    writeln!(out, "\n{}", separator())?;
    writeln!(out, "MANUAL MIGRATION REQUIRED")?;
    writeln!(out, "{}", separator())?;
    writeln!(out, "\nPlease run the following SQL in Supabase Dashboard:")?;
    writeln!(out, "1. Go to: {}", dashboard_url)?;
    writeln!(out, "2. Click 'SQL Editor' in the sidebar")?;
    writeln!(out, "3. Click 'New Query'")?;
    writeln!(out, "4. Copy and paste the following SQL:")?;
    writeln!(out, "\n{}", sql)?;
    writeln!(out, "\n5. Click 'Run'")?;
    Ok(())
}

/// Runs the migration workflow against a database CLI
pub struct MigrationRunner<C: DatabaseCli> {
    cli: C,
    config: RunnerConfig,
}

impl<C: DatabaseCli> MigrationRunner<C> {
    pub fn new(cli: C, config: RunnerConfig) -> Self {
        Self { cli, config }
    }

    pub fn cli(&self) -> &C {
        &self.cli
    }

    pub fn config(&self) -> &RunnerConfig {
        &self.config
    }

    /// Run the workflow, writing progress to `out`
    ///
    /// Every expected failure comes back as a non-success outcome. `Err` is
    /// reserved for a migration file that exists but can't be read, an
    /// unusable dashboard host, and failures writing to `out`.
    pub fn run<W: Write>(&self, out: &mut W) -> Result<MigrationRun> {
        if !self.cli.probe_version() {
            writeln!(out, "Error: Supabase CLI is not installed")?;
            writeln!(out, "Install it with: npm install -g supabase")?;
            return Ok(self.finish(MigrationOutcome::ToolMissing, None));
        }

        let migration_path = self.config.migration_path()?;
        if !migration_path.exists() {
            writeln!(out, "Error: Migration file not found at {}", migration_path.display())?;
            return Ok(self.finish(MigrationOutcome::FileMissing { path: migration_path }, None));
        }

        let request = MigrationRequest::load(&self.config.project_ref, &migration_path)?;
        // Resolved up front so a bad host can't surface after a failed push
        let dashboard_url = self.config.dashboard_url()?;

        writeln!(out, "Running migration from: {}", migration_path.display())?;
        writeln!(out, "{}", separator())?;
        writeln!(out, "{}", request.sql_content())?;
        writeln!(out, "{}", separator())?;

        writeln!(out, "\n[1/2] Attempting to push migration...")?;
        let outcome = match self.cli.push_migration(&request.project_ref, self.config.push_timeout()) {
            Ok(PushOutput::Exited { success: true, stdout, .. }) => {
                writeln!(out, "✓ Migration pushed successfully!")?;
                writeln!(out, "{}", stdout)?;
                MigrationOutcome::Applied { stdout }
            }
            Ok(PushOutput::Exited { code, stderr, .. }) => {
                writeln!(out, "Migration push failed: {}", stderr)?;
                MigrationOutcome::PushRejected { code, stderr }
            }
            Ok(PushOutput::TimedOut) => {
                writeln!(out, "Error: Command timed out")?;
                MigrationOutcome::TimedOut
            }
            Err(e) => {
                writeln!(out, "Error running migration: {}", e)?;
                MigrationOutcome::InvocationFailed { message: e.to_string() }
            }
        };

        if outcome.needs_manual_fallback(self.config.fallback_on_timeout) {
            write_manual_instructions(out, request.sql_content(), &dashboard_url)?;
        }

        Ok(self.finish(outcome, Some(&request)))
    }

    fn finish(&self, outcome: MigrationOutcome, request: Option<&MigrationRequest>) -> MigrationRun {
        MigrationRun {
            outcome,
            checksum: request.map(MigrationRequest::checksum),
            migration: request.map(MigrationRequest::file_name),
        }
    }
}
