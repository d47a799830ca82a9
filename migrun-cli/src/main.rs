//! Migrun CLI - apply a Supabase SQL migration from your terminal

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod output;

use commands::{check, config, logs, push, rpc, RunnerArgs};

/// Migrun - push a SQL migration to Supabase, with manual fallback instructions
#[derive(Parser)]
#[command(name = "migrun", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Push the migration with the Supabase CLI (default)
    Push {
        #[command(flatten)]
        runner: RunnerArgs,
    },

    /// Run pre-flight checks without pushing
    Check {
        #[command(flatten)]
        runner: RunnerArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Apply the migration through the execute_sql RPC endpoint
    Rpc {
        #[command(flatten)]
        runner: RunnerArgs,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show or save configuration
    Config {
        #[command(subcommand)]
        command: config::ConfigCommands,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = run(cli);

    match result {
        Ok(code) => code,
        Err(e) => {
            output::error(&format!("Error: {:#}", e));
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        None => push::run(RunnerArgs::default()),
        Some(Commands::Push { runner }) => push::run(runner),
        Some(Commands::Check { runner, json }) => check::run(runner, json).map(|()| ExitCode::SUCCESS),
        Some(Commands::Rpc { runner, json }) => rpc::run(runner, json).map(|()| ExitCode::SUCCESS),
        Some(Commands::Config { command }) => config::run(command).map(|()| ExitCode::SUCCESS),
        Some(Commands::Logs { command }) => logs::run(command).map(|()| ExitCode::SUCCESS),
    }
}
