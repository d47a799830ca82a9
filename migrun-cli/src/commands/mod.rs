//! CLI command implementations

pub mod check;
pub mod config;
pub mod logs;
pub mod push;
pub mod rpc;

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use migrun_core::config::{default_state_dir, RunnerConfig};
use migrun_core::{LogEvent, LoggingService, MigrunContext};

/// Flags that override the configured runner settings
#[derive(Args, Debug, Default, Clone)]
pub struct RunnerArgs {
    /// Supabase project ref to push to
    #[arg(long)]
    pub project_ref: Option<String>,
    /// Migration file, relative to the base directory unless absolute
    #[arg(short, long)]
    pub file: Option<PathBuf>,
    /// Directory relative migration paths resolve against
    #[arg(long)]
    pub base_dir: Option<PathBuf>,
    /// Supabase CLI program to run
    #[arg(long)]
    pub cli: Option<String>,
    /// Push timeout in seconds
    #[arg(long)]
    pub timeout: Option<u64>,
    /// Print manual instructions when the push times out
    #[arg(long, overrides_with = "no_fallback_on_timeout")]
    pub fallback_on_timeout: bool,
    /// Skip manual instructions on timeout, even if settings enable them
    #[arg(long, overrides_with = "fallback_on_timeout")]
    pub no_fallback_on_timeout: bool,
}

impl RunnerArgs {
    /// Apply the flags that were given on top of `config`
    pub fn apply(self, config: &mut RunnerConfig) {
        if let Some(project_ref) = self.project_ref {
            config.project_ref = project_ref;
        }
        if let Some(file) = self.file {
            config.migration_file = file;
        }
        if let Some(dir) = self.base_dir {
            config.base_dir = Some(dir);
        }
        if let Some(cli) = self.cli {
            config.cli_program = cli;
        }
        if let Some(timeout) = self.timeout {
            config.push_timeout_secs = timeout;
        }
        if self.fallback_on_timeout {
            config.fallback_on_timeout = true;
        }
        if self.no_fallback_on_timeout {
            config.fallback_on_timeout = false;
        }
    }
}

/// Get the state directory from environment or default
pub fn get_state_dir() -> Result<PathBuf> {
    Ok(default_state_dir()?)
}

/// Build the context with command-line overrides applied
pub fn get_context(args: RunnerArgs) -> Result<MigrunContext> {
    let mut ctx = MigrunContext::new(&get_state_dir()?)?;
    args.apply(&mut ctx.config);
    Ok(ctx)
}

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (shouldn't block operations)
pub fn get_logger(ctx: &MigrunContext) -> Option<LoggingService> {
    ctx.logger(env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors (logging should never break the app)
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}
