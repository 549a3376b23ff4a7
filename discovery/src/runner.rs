//! Process execution behind a swappable trait.

use std::io::{ErrorKind, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use tracing::debug;
use wait_timeout::ChildExt;

/// Exit code reported when the program could not be started.
pub const SPAWN_FAILED_EXIT_CODE: i32 = -1;
/// Exit code reported when the program was killed after its timeout.
pub const TIMED_OUT_EXIT_CODE: i32 = -2;

/// How long pipe output is still collected after the child has exited.
/// Background grandchildren can keep the pipes open indefinitely.
const PIPE_DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Captured result of one program run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    /// Process exit code; negative values mean the program never completed.
    pub exit_code: i32,
}

impl RunOutput {
    pub fn new(stdout: &str, stderr: &str, exit_code: i32) -> Self {
        Self {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns `true` when the program never produced a real exit status.
    pub fn did_not_complete(&self) -> bool {
        self.exit_code < 0
    }
}

/// Runs an external program. Failures are reported in the output, never as
/// errors.
pub trait CommandRunner: Send + Sync {
    fn run(&self, command: &str, args: &[String], timeout: Duration) -> RunOutput;
}

/// Runs programs with [`std::process::Command`].
///
/// stdin is closed, stdout/stderr are drained on background threads so a
/// chatty child cannot fill its pipe and stall, and the child is killed once
/// the timeout elapses.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    fn run(&self, command: &str, args: &[String], timeout: Duration) -> RunOutput {
        let spawn_result = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn();

        let mut child = match spawn_result {
            Ok(child) => child,
            Err(e) => {
                debug!(command, ?args, error = %e, "Failed to spawn command");
                return RunOutput::new(
                    "",
                    &format!("failed to spawn '{command}': {e}"),
                    SPAWN_FAILED_EXIT_CODE,
                );
            }
        };

        let stdout_chunks = child.stdout.take().map(drain);
        let stderr_chunks = child.stderr.take().map(drain);

        match child.wait_timeout(timeout) {
            Ok(Some(status)) => {
                let deadline = Instant::now() + PIPE_DRAIN_GRACE;
                let stdout = collect_drain(stdout_chunks, deadline);
                let stderr = collect_drain(stderr_chunks, deadline);
                // Killed by a signal: no code, report as a generic failure.
                let exit_code = status.code().unwrap_or(1);
                debug!(command, ?args, exit_code, "Command finished");
                RunOutput {
                    stdout,
                    stderr,
                    exit_code,
                }
            }
            Ok(None) => {
                let millis = timeout.as_millis();
                debug!(command, ?args, timeout_ms = millis, "Command timed out, killing process");
                kill(&mut child);
                // Grandchildren may still hold the pipes; leave the drain
                // threads detached.
                RunOutput::new("", &format!("timed out after {millis}ms"), TIMED_OUT_EXIT_CODE)
            }
            Err(e) => {
                debug!(command, ?args, error = %e, "Failed to wait on command");
                kill(&mut child);
                RunOutput::new("", &format!("wait failed: {e}"), SPAWN_FAILED_EXIT_CODE)
            }
        }
    }
}

/// Forwards pipe output chunk by chunk; the channel closes at end of stream.
fn drain<R: Read + Send + 'static>(mut pipe: R) -> Receiver<Vec<u8>> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut chunk = [0u8; 8192];
        loop {
            match pipe.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(chunk[..n].to_vec()).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => {
                    debug!(error = %e, "Failed to read child pipe");
                    break;
                }
            }
        }
    });
    rx
}

/// Collects forwarded output until end of stream or `deadline`, whichever
/// comes first. Output received before the deadline is kept.
fn collect_drain(chunks: Option<Receiver<Vec<u8>>>, deadline: Instant) -> String {
    let Some(chunks) = chunks else {
        return String::new();
    };
    let mut buf = Vec::new();
    loop {
        let wait = deadline.saturating_duration_since(Instant::now());
        match chunks.recv_timeout(wait) {
            Ok(chunk) => buf.extend_from_slice(&chunk),
            Err(RecvTimeoutError::Disconnected) => break,
            Err(RecvTimeoutError::Timeout) => {
                debug!("Pipe still open after exit; keeping partial output");
                break;
            }
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

fn kill(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}
