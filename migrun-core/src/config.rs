//! Configuration management
//!
//! Settings are layered: built-in defaults, then `settings.json` in the
//! state directory, then `MIGRUN_*` environment variables. The CLI applies
//! its own flags on top.
//!
//! ```json
//! {
//!   "migration": {
//!     "projectRef": "degfdhoxmuzmccsouxnk",
//!     "migrationFile": "supabase/migrations/20251113_fix_debt_receivable_rls.sql",
//!     "cliProgram": "supabase",
//!     "pushTimeoutSecs": 30,
//!     "fallbackOnTimeout": false
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::{Error, Result};

pub const DEFAULT_PROJECT_REF: &str = "degfdhoxmuzmccsouxnk";
pub const DEFAULT_MIGRATION_FILE: &str = "supabase/migrations/20251113_fix_debt_receivable_rls.sql";
pub const DEFAULT_CLI_PROGRAM: &str = "supabase";
pub const DEFAULT_PUSH_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_DASHBOARD_HOST: &str = "supabase.com";

/// Environment variable holding the key the RPC applier needs
pub const SERVICE_ROLE_KEY_VAR: &str = "SUPABASE_SERVICE_ROLE_KEY";

/// Raw settings.json structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SettingsFile {
    #[serde(default)]
    migration: MigrationSettings,
    #[serde(flatten)]
    other: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MigrationSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    project_ref: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    migration_file: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    base_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    cli_program: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    push_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    dashboard_host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    fallback_on_timeout: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    supabase_url: Option<String>,
}

/// Runner configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunnerConfig {
    pub project_ref: String,
    pub migration_file: PathBuf,
    /// Directory relative migration paths resolve against; the executable's
    /// directory when unset
    pub base_dir: Option<PathBuf>,
    pub cli_program: String,
    pub push_timeout_secs: u64,
    pub dashboard_host: String,
    pub fallback_on_timeout: bool,
    /// REST endpoint for the RPC applier; derived from the project ref when unset
    pub supabase_url: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            project_ref: DEFAULT_PROJECT_REF.to_string(),
            migration_file: PathBuf::from(DEFAULT_MIGRATION_FILE),
            base_dir: None,
            cli_program: DEFAULT_CLI_PROGRAM.to_string(),
            push_timeout_secs: DEFAULT_PUSH_TIMEOUT_SECS,
            dashboard_host: DEFAULT_DASHBOARD_HOST.to_string(),
            fallback_on_timeout: false,
            supabase_url: None,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" | "yes" | "TRUE" | "YES" => Some(true),
        "false" | "0" | "no" | "FALSE" | "NO" => Some(false),
        _ => None,
    }
}

/// Default state directory: `MIGRUN_DIR` or `~/.migrun`
pub fn default_state_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("MIGRUN_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".migrun"))
        .ok_or_else(|| Error::config("Could not find home directory; set MIGRUN_DIR"))
}

impl RunnerConfig {
    /// Load config from the state directory, then apply environment overrides
    pub fn load(state_dir: &Path) -> Result<Self> {
        let mut config = Self::load_file(state_dir)?;
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Load config from `settings.json` only
    ///
    /// A missing file yields defaults; a malformed one is an error.
    pub fn load_file(state_dir: &Path) -> Result<Self> {
        let settings_path = state_dir.join("settings.json");

        let raw: SettingsFile = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str(&content)?
        } else {
            SettingsFile::default()
        };

        let defaults = Self::default();
        let m = raw.migration;
        Ok(Self {
            project_ref: m.project_ref.unwrap_or(defaults.project_ref),
            migration_file: m.migration_file.unwrap_or(defaults.migration_file),
            base_dir: m.base_dir,
            cli_program: m.cli_program.unwrap_or(defaults.cli_program),
            push_timeout_secs: m.push_timeout_secs.unwrap_or(defaults.push_timeout_secs),
            dashboard_host: m.dashboard_host.unwrap_or(defaults.dashboard_host),
            fallback_on_timeout: m.fallback_on_timeout.unwrap_or(defaults.fallback_on_timeout),
            supabase_url: m.supabase_url,
        })
    }

    /// Apply `MIGRUN_*` overrides read through `lookup`
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("MIGRUN_PROJECT_REF") {
            self.project_ref = v;
        }
        if let Some(v) = lookup("MIGRUN_MIGRATION_FILE") {
            self.migration_file = PathBuf::from(v);
        }
        if let Some(v) = lookup("MIGRUN_CLI") {
            self.cli_program = v;
        }
        if let Some(v) = lookup("MIGRUN_TIMEOUT_SECS") {
            self.push_timeout_secs = v
                .parse()
                .map_err(|_| Error::config(format!("MIGRUN_TIMEOUT_SECS is not a number: {}", v)))?;
        }
        if let Some(v) = lookup("MIGRUN_FALLBACK_ON_TIMEOUT") {
            self.fallback_on_timeout = parse_bool(&v).ok_or_else(|| {
                Error::config(format!("MIGRUN_FALLBACK_ON_TIMEOUT is not a boolean: {}", v))
            })?;
        }
        Ok(())
    }

    /// Save the migration settings, preserving any other keys in the file
    pub fn save(&self, state_dir: &Path) -> Result<()> {
        let settings_path = state_dir.join("settings.json");

        let mut settings = if settings_path.exists() {
            let content = std::fs::read_to_string(&settings_path)?;
            serde_json::from_str::<SettingsFile>(&content).unwrap_or_default()
        } else {
            SettingsFile::default()
        };

        settings.migration = MigrationSettings {
            project_ref: Some(self.project_ref.clone()),
            migration_file: Some(self.migration_file.clone()),
            base_dir: self.base_dir.clone(),
            cli_program: Some(self.cli_program.clone()),
            push_timeout_secs: Some(self.push_timeout_secs),
            dashboard_host: Some(self.dashboard_host.clone()),
            fallback_on_timeout: Some(self.fallback_on_timeout),
            supabase_url: self.supabase_url.clone(),
        };

        let content = serde_json::to_string_pretty(&settings)?;
        std::fs::write(&settings_path, content)?;
        Ok(())
    }

    /// Check the values a run depends on
    pub fn validate(&self) -> Result<()> {
        let project_ref_re = Regex::new(r"^[a-z0-9]{20}$")
            .map_err(|e| Error::Other(e.to_string()))?;
        if !project_ref_re.is_match(&self.project_ref) {
            return Err(Error::config(format!(
                "Invalid project ref '{}': expected 20 lowercase letters or digits",
                self.project_ref
            )));
        }
        if self.push_timeout_secs == 0 {
            return Err(Error::config("Push timeout must be at least 1 second"));
        }
        if self.cli_program.trim().is_empty() {
            return Err(Error::config("CLI program must not be empty"));
        }
        self.dashboard_url()?;
        Ok(())
    }

    pub fn push_timeout(&self) -> Duration {
        Duration::from_secs(self.push_timeout_secs)
    }

    /// Directory relative migration paths resolve against
    pub fn resolve_base_dir(&self) -> Result<PathBuf> {
        if let Some(dir) = &self.base_dir {
            return Ok(dir.clone());
        }
        let exe = std::env::current_exe()?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| Error::config("Could not determine the executable's directory"))
    }

    /// Absolute path of the migration file
    pub fn migration_path(&self) -> Result<PathBuf> {
        if self.migration_file.is_absolute() {
            return Ok(self.migration_file.clone());
        }
        Ok(self.resolve_base_dir()?.join(&self.migration_file))
    }

    /// Dashboard page for the project, e.g. `https://supabase.com/dashboard/project/<ref>`
    pub fn dashboard_url(&self) -> Result<String> {
        let base = Url::parse(&format!("https://{}/", self.dashboard_host))
            .map_err(|e| Error::config(format!("Invalid dashboard host '{}': {}", self.dashboard_host, e)))?;
        let url = base
            .join(&format!("dashboard/project/{}", self.project_ref))
            .map_err(|e| Error::config(format!("Invalid dashboard URL: {}", e)))?;
        Ok(url.to_string())
    }

    /// REST base URL used by the RPC applier
    pub fn supabase_url(&self) -> String {
        self.supabase_url
            .clone()
            .unwrap_or_else(|| format!("https://{}.supabase.co", self.project_ref))
    }
}
