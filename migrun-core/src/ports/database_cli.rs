//! Database CLI port
//!
//! Defines the interface to the external command-line tool that applies
//! migrations to the remote project (the Supabase CLI in production).

use std::time::Duration;

use crate::domain::result::Result;

/// What came back from a push invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutput {
    /// The process ran to completion
    Exited {
        success: bool,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },
    /// The process was still running at the deadline and was killed
    TimedOut,
}

impl PushOutput {
    /// Convenience constructor for a completed process
    pub fn exited(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        PushOutput::Exited {
            success: code == 0,
            code: Some(code),
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }
}

/// Database CLI trait
///
/// The runner only sees the exit status and captured output streams;
/// everything the tool does remotely is opaque.
pub trait DatabaseCli {
    /// Tool name for messages and logs (e.g., "supabase")
    fn name(&self) -> &str;

    /// Run the version query with output suppressed
    ///
    /// Returns false when the tool is not on PATH or exits non-zero.
    fn probe_version(&self) -> bool;

    /// Push pending migrations to the given project
    ///
    /// # Arguments
    /// * `project_ref` - Remote project identifier
    /// * `timeout` - Upper bound on how long the push may run
    ///
    /// # Errors
    /// Returns an error when the process cannot be launched or waited on.
    fn push_migration(&self, project_ref: &str, timeout: Duration) -> Result<PushOutput>;
}
