//! Scripted database CLI
//!
//! Returns canned answers instead of spawning a process. Used to exercise
//! the runner without the real Supabase CLI installed.

use std::cell::{Cell, RefCell};
use std::time::Duration;

use crate::domain::result::{Error, Result};
use crate::ports::{DatabaseCli, PushOutput};

#[derive(Debug, Clone)]
enum ScriptedPush {
    Output(PushOutput),
    Fail(String),
}

/// Database CLI with predetermined behavior
#[derive(Debug)]
pub struct ScriptedCli {
    installed: bool,
    push: ScriptedPush,
    probes: Cell<usize>,
    pushes: Cell<usize>,
    last_project_ref: RefCell<Option<String>>,
}

impl ScriptedCli {
    fn with(installed: bool, push: ScriptedPush) -> Self {
        Self {
            installed,
            push,
            probes: Cell::new(0),
            pushes: Cell::new(0),
            last_project_ref: RefCell::new(None),
        }
    }

    /// A CLI that is not installed
    pub fn missing() -> Self {
        Self::with(false, ScriptedPush::Fail("not installed".to_string()))
    }

    /// An installed CLI whose push exits with `code`
    pub fn exiting(code: i32, stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self::with(true, ScriptedPush::Output(PushOutput::exited(code, stdout, stderr)))
    }

    /// An installed CLI whose push never finishes in time
    pub fn timing_out() -> Self {
        Self::with(true, ScriptedPush::Output(PushOutput::TimedOut))
    }

    /// An installed CLI whose push cannot be launched
    pub fn failing(message: impl Into<String>) -> Self {
        Self::with(true, ScriptedPush::Fail(message.into()))
    }

    pub fn probe_count(&self) -> usize {
        self.probes.get()
    }

    pub fn push_count(&self) -> usize {
        self.pushes.get()
    }

    /// Project ref passed to the most recent push
    pub fn last_project_ref(&self) -> Option<String> {
        self.last_project_ref.borrow().clone()
    }
}

impl DatabaseCli for ScriptedCli {
    fn name(&self) -> &str {
        "scripted"
    }

    fn probe_version(&self) -> bool {
        self.probes.set(self.probes.get() + 1);
        self.installed
    }

    fn push_migration(&self, project_ref: &str, _timeout: Duration) -> Result<PushOutput> {
        self.pushes.set(self.pushes.get() + 1);
        *self.last_project_ref.borrow_mut() = Some(project_ref.to_string());

        match &self.push {
            ScriptedPush::Output(output) => Ok(output.clone()),
            ScriptedPush::Fail(message) => Err(Error::Other(message.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_calls() {
        let cli = ScriptedCli::exiting(0, "ok", "");
        assert!(cli.probe_version());
        let output = cli.push_migration("ref123", Duration::from_secs(1)).unwrap();

        assert_eq!(output, PushOutput::exited(0, "ok", ""));
        assert_eq!(cli.probe_count(), 1);
        assert_eq!(cli.push_count(), 1);
        assert_eq!(cli.last_project_ref().as_deref(), Some("ref123"));
    }

    #[test]
    fn test_failing_push_is_error() {
        let cli = ScriptedCli::failing("spawn failed");
        let err = cli.push_migration("ref", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.to_string(), "spawn failed");
    }
}
