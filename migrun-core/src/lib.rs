//! Migrun Core - apply a Supabase SQL migration through the Supabase CLI
//!
//! This crate follows hexagonal architecture:
//!
//! - **domain**: The migration request and run outcome
//! - **ports**: Trait definitions for external dependencies (DatabaseCli)
//! - **services**: The runner, pre-flight checks, and event logging
//! - **adapters**: Concrete implementations (Supabase CLI process, RPC, scripted)

pub mod adapters;
pub mod config;
pub mod domain;
mod log_migrations;
pub mod ports;
pub mod services;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use adapters::rpc::RpcApplier;
use adapters::supabase_cli::SupabaseCli;
use config::RunnerConfig;
use services::*;

// Re-export commonly used types at crate root
pub use domain::result::Error;
pub use domain::{MigrationOutcome, MigrationRequest};
pub use services::{LogEvent, LoggingService, MigrationRun};

/// Main context for migrun operations
///
/// Holds the state directory and the layered configuration. Services are
/// built on demand from the current config so callers can adjust it first.
pub struct MigrunContext {
    pub state_dir: PathBuf,
    pub config: RunnerConfig,
}

impl MigrunContext {
    /// Create a context rooted at `state_dir`, creating the directory if needed
    pub fn new(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir)
            .with_context(|| format!("Failed to create state directory: {:?}", state_dir))?;

        let config = RunnerConfig::load(state_dir).context("Failed to load configuration")?;

        Ok(Self {
            state_dir: state_dir.to_path_buf(),
            config,
        })
    }

    /// The configured database CLI
    pub fn database_cli(&self) -> SupabaseCli {
        SupabaseCli::new(self.config.cli_program.clone())
    }

    pub fn runner(&self) -> MigrationRunner<SupabaseCli> {
        MigrationRunner::new(self.database_cli(), self.config.clone())
    }

    /// RPC applier for the configured project, keyed from the environment
    pub fn rpc_applier(&self) -> Result<RpcApplier> {
        Ok(RpcApplier::from_env(&self.config.supabase_url())?)
    }

    /// Open the event log
    pub fn logger(&self, app_version: &str) -> Result<LoggingService> {
        LoggingService::new(&self.state_dir, app_version)
    }
}
