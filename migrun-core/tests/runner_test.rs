//! Integration tests for the migration runner
//!
//! The database CLI is replaced at the trait level by ScriptedCli, or by
//! small shell scripts run through the real SupabaseCli adapter.
//!
//! Run with: cargo test --test runner_test -- --nocapture

use std::path::Path;
use tempfile::TempDir;

use migrun_core::adapters::scripted::ScriptedCli;
use migrun_core::config::RunnerConfig;
use migrun_core::ports::DatabaseCli;
use migrun_core::services::MigrationRunner;
use migrun_core::{MigrationOutcome, MigrationRun};

const MIGRATION: &str = "supabase/migrations/20251113_fix_debt_receivable_rls.sql";
const POLICY_SQL: &str = "DROP POLICY IF EXISTS \"Everyone can view debt_receivable\" ON public.debt_receivable;\n\
CREATE POLICY \"Everyone can view debt_receivable\" ON public.debt_receivable FOR SELECT USING (true);\n";

// ============================================================================
// Test Helpers
// ============================================================================

/// Config rooted at `dir` with the default relative migration path
fn config_in(dir: &Path) -> RunnerConfig {
    RunnerConfig {
        base_dir: Some(dir.to_path_buf()),
        ..RunnerConfig::default()
    }
}

/// Write the migration file under `dir`
fn write_migration(dir: &Path, sql: &str) {
    let path = dir.join(MIGRATION);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, sql).unwrap();
}

fn run<C: DatabaseCli>(runner: &MigrationRunner<C>) -> (MigrationRun, String) {
    let mut buf = Vec::new();
    let result = runner.run(&mut buf).expect("run should not error");
    (result, String::from_utf8(buf).unwrap())
}

const DASHBOARD: &str = "https://supabase.com/dashboard/project/degfdhoxmuzmccsouxnk";

// ============================================================================
// Tool Presence
// ============================================================================

/// A missing CLI stops the run before the file is even looked at
#[test]
fn test_missing_cli_returns_false_without_file_access() {
    let temp_dir = TempDir::new().unwrap();
    // No migration file: a file check would report it, the probe must come first
    let runner = MigrationRunner::new(ScriptedCli::missing(), config_in(temp_dir.path()));

    let (result, output) = run(&runner);

    assert!(!result.succeeded());
    assert_eq!(result.outcome, MigrationOutcome::ToolMissing);
    assert_eq!(
        output,
        "Error: Supabase CLI is not installed\nInstall it with: npm install -g supabase\n"
    );
    assert!(!output.contains("not found"));
    assert_eq!(runner.cli().probe_count(), 1);
    assert_eq!(runner.cli().push_count(), 0);
}

// ============================================================================
// File Resolution
// ============================================================================

#[test]
fn test_missing_file_reports_resolved_path() {
    let temp_dir = TempDir::new().unwrap();
    let runner = MigrationRunner::new(ScriptedCli::exiting(0, "", ""), config_in(temp_dir.path()));

    let (result, output) = run(&runner);

    let expected_path = temp_dir.path().join(MIGRATION);
    assert!(!result.succeeded());
    assert_eq!(result.outcome, MigrationOutcome::FileMissing { path: expected_path.clone() });
    assert_eq!(output, format!("Error: Migration file not found at {}\n", expected_path.display()));
    assert_eq!(runner.cli().push_count(), 0);
}

// ============================================================================
// Push Outcomes
// ============================================================================

#[test]
fn test_push_success_returns_true_without_fallback() {
    let temp_dir = TempDir::new().unwrap();
    write_migration(temp_dir.path(), "SELECT 1;");
    let runner = MigrationRunner::new(ScriptedCli::exiting(0, "Applied.", ""), config_in(temp_dir.path()));

    let (result, output) = run(&runner);

    assert!(result.succeeded());
    assert!(output.contains("✓ Migration pushed successfully!"));
    assert!(output.contains("Applied."));
    assert!(!output.contains("MANUAL MIGRATION REQUIRED"));
    assert_eq!(runner.cli().last_project_ref().as_deref(), Some("degfdhoxmuzmccsouxnk"));
}

#[test]
fn test_push_failure_prints_stderr_then_fallback() {
    let temp_dir = TempDir::new().unwrap();
    write_migration(temp_dir.path(), "SELECT 1;");
    let runner = MigrationRunner::new(
        ScriptedCli::exiting(1, "", "permission denied"),
        config_in(temp_dir.path()),
    );

    let (result, output) = run(&runner);

    assert!(!result.succeeded());
    assert_eq!(
        result.outcome,
        MigrationOutcome::PushRejected { code: Some(1), stderr: "permission denied".to_string() }
    );

    let failure_at = output.find("Migration push failed: permission denied").expect("stderr printed");
    let manual_at = output.find("MANUAL MIGRATION REQUIRED").expect("fallback printed");
    assert!(failure_at < manual_at);

    let fallback = &output[manual_at..];
    assert!(fallback.contains(&format!("1. Go to: {}", DASHBOARD)));
    assert!(fallback.contains("\nSELECT 1;\n"));
    assert!(fallback.ends_with("\n5. Click 'Run'\n"));
}

#[test]
fn test_fallback_contains_full_sql() {
    let temp_dir = TempDir::new().unwrap();
    write_migration(temp_dir.path(), POLICY_SQL);
    let runner = MigrationRunner::new(ScriptedCli::exiting(2, "", "boom"), config_in(temp_dir.path()));

    let (_, output) = run(&runner);

    // Once in the echo, once in the fallback block
    assert_eq!(output.matches(POLICY_SQL).count(), 2);
}

#[test]
fn test_timeout_skips_fallback() {
    let temp_dir = TempDir::new().unwrap();
    write_migration(temp_dir.path(), "SELECT 1;");
    let runner = MigrationRunner::new(ScriptedCli::timing_out(), config_in(temp_dir.path()));

    let (result, output) = run(&runner);

    assert_eq!(result.outcome, MigrationOutcome::TimedOut);
    assert!(output.ends_with("Error: Command timed out\n"));
    assert!(!output.contains("MANUAL MIGRATION REQUIRED"));
}

#[test]
fn test_timeout_fallback_when_enabled() {
    let temp_dir = TempDir::new().unwrap();
    write_migration(temp_dir.path(), "SELECT 1;");
    let config = RunnerConfig {
        fallback_on_timeout: true,
        ..config_in(temp_dir.path())
    };
    let runner = MigrationRunner::new(ScriptedCli::timing_out(), config);

    let (result, output) = run(&runner);

    assert!(!result.succeeded());
    assert!(output.contains("Error: Command timed out"));
    assert!(output.contains("MANUAL MIGRATION REQUIRED"));
}

#[test]
fn test_invocation_error_falls_through_to_fallback() {
    let temp_dir = TempDir::new().unwrap();
    write_migration(temp_dir.path(), "SELECT 1;");
    let runner = MigrationRunner::new(ScriptedCli::failing("pipe closed"), config_in(temp_dir.path()));

    let (result, output) = run(&runner);

    assert_eq!(
        result.outcome,
        MigrationOutcome::InvocationFailed { message: "pipe closed".to_string() }
    );
    assert!(output.contains("Error running migration: pipe closed"));
    assert!(output.contains("MANUAL MIGRATION REQUIRED"));
}

#[test]
fn test_custom_project_ref_reaches_cli_and_dashboard() {
    let temp_dir = TempDir::new().unwrap();
    write_migration(temp_dir.path(), "SELECT 1;");
    let config = RunnerConfig {
        project_ref: "abcdefghijklmnopqrst".to_string(),
        ..config_in(temp_dir.path())
    };
    let runner = MigrationRunner::new(ScriptedCli::exiting(1, "", "nope"), config);

    let (_, output) = run(&runner);

    assert_eq!(runner.cli().last_project_ref().as_deref(), Some("abcdefghijklmnopqrst"));
    assert!(output.contains("https://supabase.com/dashboard/project/abcdefghijklmnopqrst"));
}

// ============================================================================
// Real Process Tests
// ============================================================================

#[cfg(unix)]
mod process {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::time::{Duration, Instant};

    use migrun_core::adapters::supabase_cli::SupabaseCli;

    /// Shell script that answers `--version` and runs `push_body` for everything else
    fn fake_supabase(dir: &Path, push_body: &str) -> SupabaseCli {
        let path = dir.join("fake-supabase");
        let script = format!(
            "#!/bin/sh\nif [ \"$1\" = \"--version\" ]; then\n  echo 1.0.0\n  exit 0\nfi\n{}\n",
            push_body
        );
        std::fs::write(&path, script).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        SupabaseCli::new(path.to_string_lossy().to_string())
    }

    #[test]
    fn test_end_to_end_success() {
        let temp_dir = TempDir::new().unwrap();
        write_migration(temp_dir.path(), "SELECT 1;");
        let cli = fake_supabase(temp_dir.path(), "echo Applied.");
        let runner = MigrationRunner::new(cli, config_in(temp_dir.path()));

        let (result, output) = run(&runner);

        assert!(result.succeeded());
        assert!(output.contains("✓ Migration pushed successfully!\nApplied.\n"));
    }

    #[test]
    fn test_end_to_end_rejection() {
        let temp_dir = TempDir::new().unwrap();
        write_migration(temp_dir.path(), "SELECT 1;");
        let cli = fake_supabase(temp_dir.path(), "echo 'permission denied' >&2\nexit 1");
        let runner = MigrationRunner::new(cli, config_in(temp_dir.path()));

        let (result, output) = run(&runner);

        assert!(!result.succeeded());
        assert!(output.contains("Migration push failed: permission denied"));
        assert!(output.contains("MANUAL MIGRATION REQUIRED"));
    }

    #[test]
    fn test_end_to_end_timeout() {
        let temp_dir = TempDir::new().unwrap();
        write_migration(temp_dir.path(), "SELECT 1;");
        let cli = fake_supabase(temp_dir.path(), "exec sleep 10");
        let config = RunnerConfig {
            push_timeout_secs: 1,
            ..config_in(temp_dir.path())
        };
        let runner = MigrationRunner::new(cli, config);

        let start = Instant::now();
        let (result, output) = run(&runner);

        assert_eq!(result.outcome, MigrationOutcome::TimedOut);
        assert!(!output.contains("MANUAL MIGRATION REQUIRED"));
        assert!(start.elapsed() < Duration::from_secs(8));
    }
}
