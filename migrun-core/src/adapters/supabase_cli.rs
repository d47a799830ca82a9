//! Supabase CLI adapter
//!
//! Runs the `supabase` binary as a child process. The push is bounded by a
//! deadline: the child is polled until it exits or the deadline passes, at
//! which point it is killed. Output collection shares the same deadline, so
//! a grandchild holding the pipes open can't stretch the push past it.

use std::io::Read;
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use crate::domain::result::{Error, Result};
use crate::ports::{DatabaseCli, PushOutput};

/// How often a running push is checked for exit
const POLL_INTERVAL_MS: u64 = 50;

/// Supabase CLI invoked through the OS
#[derive(Debug, Clone)]
pub struct SupabaseCli {
    program: String,
}

impl SupabaseCli {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for SupabaseCli {
    fn default() -> Self {
        Self::new("supabase")
    }
}

/// Read a child pipe to the end on its own thread
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let mut buf = Vec::new();
        if let Some(mut p) = pipe {
            let _ = p.read_to_end(&mut buf);
        }
        let _ = tx.send(String::from_utf8_lossy(&buf).into_owned());
    });
    rx
}

/// Wait for a drained pipe until `deadline`; `None` means the deadline passed
fn collect(rx: &Receiver<String>, deadline: Instant, pipe: &str) -> Result<Option<String>> {
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => Ok(Some(text)),
        Err(RecvTimeoutError::Timeout) => Ok(None),
        Err(RecvTimeoutError::Disconnected) => Err(Error::Other(format!("{} reader thread panicked", pipe))),
    }
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

impl DatabaseCli for SupabaseCli {
    fn name(&self) -> &str {
        &self.program
    }

    fn probe_version(&self) -> bool {
        Command::new(&self.program)
            .arg("--version")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|status| status.success())
            .unwrap_or(false)
    }

    fn push_migration(&self, project_ref: &str, timeout: Duration) -> Result<PushOutput> {
        let mut child = Command::new(&self.program)
            .args(["db", "push", "--project-ref", project_ref])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        // Both pipes are drained concurrently so a chatty child can't block on a full pipe
        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    kill_and_reap(&mut child);
                    return Ok(PushOutput::TimedOut);
                }
                Ok(None) => thread::sleep(Duration::from_millis(POLL_INTERVAL_MS)),
                Err(e) => {
                    kill_and_reap(&mut child);
                    return Err(e.into());
                }
            }
        };

        // The child is gone, but anything it left running may still hold the pipes
        let Some(stdout) = collect(&stdout, deadline, "stdout")? else {
            return Ok(PushOutput::TimedOut);
        };
        let Some(stderr) = collect(&stderr, deadline, "stderr")? else {
            return Ok(PushOutput::TimedOut);
        };

        Ok(PushOutput::Exited {
            success: status.success(),
            code: status.code(),
            stdout,
            stderr,
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::{tempdir, TempDir};

    /// Write an executable shell script standing in for the supabase binary
    fn fake_cli(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-supabase");
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn cli_for(dir: &TempDir, body: &str) -> SupabaseCli {
        SupabaseCli::new(fake_cli(dir.path(), body).to_string_lossy().to_string())
    }

    #[test]
    fn test_probe_missing_program() {
        let cli = SupabaseCli::new("migrun-definitely-not-installed");
        assert!(!cli.probe_version());
    }

    #[test]
    fn test_probe_version_success_and_failure() {
        let dir = tempdir().unwrap();
        assert!(cli_for(&dir, "echo 1.200.3").probe_version());

        let dir = tempdir().unwrap();
        assert!(!cli_for(&dir, "exit 3").probe_version());
    }

    #[test]
    fn test_push_passes_project_ref_and_captures_stdout() {
        let dir = tempdir().unwrap();
        let cli = cli_for(&dir, r#"echo "args: $*""#);

        let output = cli.push_migration("abcdefghijklmnopqrst", Duration::from_secs(10)).unwrap();
        match output {
            PushOutput::Exited { success, code, stdout, .. } => {
                assert!(success);
                assert_eq!(code, Some(0));
                assert_eq!(stdout.trim(), "args: db push --project-ref abcdefghijklmnopqrst");
            }
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_push_non_zero_captures_stderr() {
        let dir = tempdir().unwrap();
        let cli = cli_for(&dir, "echo 'permission denied' >&2\nexit 1");

        let output = cli.push_migration("ref", Duration::from_secs(10)).unwrap();
        assert_eq!(output, PushOutput::exited(1, "", "permission denied\n"));
    }

    #[test]
    fn test_push_times_out() {
        let dir = tempdir().unwrap();
        let cli = cli_for(&dir, "exec sleep 5");

        let start = Instant::now();
        let output = cli.push_migration("ref", Duration::from_millis(300)).unwrap();
        assert_eq!(output, PushOutput::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn test_background_process_holding_pipes_times_out() {
        let dir = tempdir().unwrap();
        let cli = cli_for(&dir, "sleep 6 &\necho failed >&2\nexit 1");

        let start = Instant::now();
        let output = cli.push_migration("ref", Duration::from_secs(1)).unwrap();
        assert_eq!(output, PushOutput::TimedOut);
        assert!(start.elapsed() < Duration::from_secs(4), "push ran {:?}", start.elapsed());
    }

    #[test]
    fn test_push_missing_program_is_error() {
        let cli = SupabaseCli::new("migrun-definitely-not-installed");
        assert!(cli.push_migration("ref", Duration::from_secs(1)).is_err());
    }
}
