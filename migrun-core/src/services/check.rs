//! Check service - pre-flight checks before pushing a migration

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::json;

use crate::config::{RunnerConfig, SERVICE_ROLE_KEY_VAR};
use crate::domain::MigrationRequest;
use crate::ports::DatabaseCli;
use crate::services::syntax::validate_sql_syntax;

/// Runs pre-flight checks without touching the remote project
pub struct CheckService<'a, C: DatabaseCli> {
    cli: &'a C,
    config: &'a RunnerConfig,
}

impl<'a, C: DatabaseCli> CheckService<'a, C> {
    pub fn new(cli: &'a C, config: &'a RunnerConfig) -> Self {
        Self { cli, config }
    }

    /// Run all checks
    pub fn run_checks(&self) -> CheckReport {
        let mut checks = BTreeMap::new();

        checks.insert(
            "config".to_string(),
            match self.config.validate() {
                Ok(()) => CheckResult::pass(format!("Project {}", self.config.project_ref)),
                Err(e) => CheckResult::error(e.to_string()),
            },
        );

        checks.insert(
            "cli_installed".to_string(),
            if self.cli.probe_version() {
                CheckResult::pass(format!("{} is available", self.cli.name()))
            } else {
                CheckResult::error(format!(
                    "{} not found. Install it with: npm install -g supabase",
                    self.cli.name()
                ))
            },
        );

        let request = match self.config.migration_path() {
            Ok(path) if path.exists() => match MigrationRequest::load(&self.config.project_ref, &path) {
                Ok(request) => {
                    checks.insert(
                        "migration_file".to_string(),
                        CheckResult::pass(path.display().to_string()).with_details(vec![json!({
                            "checksum": request.checksum(),
                            "bytes": request.sql_content().len(),
                        })]),
                    );
                    Some(request)
                }
                Err(e) => {
                    checks.insert("migration_file".to_string(), CheckResult::error(e.to_string()));
                    None
                }
            },
            Ok(path) => {
                checks.insert(
                    "migration_file".to_string(),
                    CheckResult::error(format!("Migration file not found at {}", path.display())),
                );
                None
            }
            Err(e) => {
                checks.insert("migration_file".to_string(), CheckResult::error(e.to_string()));
                None
            }
        };

        if let Some(request) = &request {
            checks.insert(
                "sql_syntax".to_string(),
                match validate_sql_syntax(request.sql_content()) {
                    Ok(count) => CheckResult::pass(format!("{} statement(s) parsed", count)),
                    Err(e) => CheckResult::warning(format!("Could not parse SQL: {}", e)),
                },
            );
        }

        checks.insert(
            "service_role_key".to_string(),
            if std::env::var(SERVICE_ROLE_KEY_VAR).map(|k| !k.is_empty()).unwrap_or(false) {
                CheckResult::pass("RPC apply available")
            } else {
                CheckResult::warning(format!("{} is not set; RPC apply unavailable", SERVICE_ROLE_KEY_VAR))
            },
        );

        let passed = checks.values().filter(|c| c.status == "pass").count() as i64;
        let warnings = checks.values().filter(|c| c.status == "warning").count() as i64;
        let errors = checks.values().filter(|c| c.status == "error").count() as i64;

        CheckReport {
            checks,
            summary: CheckSummary { passed, warnings, errors },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckReport {
    pub checks: BTreeMap<String, CheckResult>,
    pub summary: CheckSummary,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub status: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<serde_json::Value>>,
}

impl CheckResult {
    fn new(status: &str, message: impl Into<String>) -> Self {
        Self {
            status: status.to_string(),
            message: message.into(),
            details: None,
        }
    }

    fn pass(message: impl Into<String>) -> Self {
        Self::new("pass", message)
    }

    fn warning(message: impl Into<String>) -> Self {
        Self::new("warning", message)
    }

    fn error(message: impl Into<String>) -> Self {
        Self::new("error", message)
    }

    fn with_details(mut self, details: Vec<serde_json::Value>) -> Self {
        self.details = Some(details);
        self
    }
}

#[derive(Debug, Serialize)]
pub struct CheckSummary {
    pub passed: i64,
    pub warnings: i64,
    pub errors: i64,
}
