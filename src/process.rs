//! Blocking subprocess execution for providers and sinks.
//!
//! The child's stdout and stderr are captured on separate pipes, its
//! exit status is checked, and it is killed if it outlives the timeout.
//! Draining stdout counts against the same timeout. A `ChildGuard` kills
//! and reaps the child on every early return.

use std::io::{self, Read, Write};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use zeroize::Zeroizing;

/// How often a running child is polled for exit.
const POLL_INTERVAL: Duration = Duration::from_millis(20);

/// How long stderr and stdin may stay open after the child has exited.
const PIPE_GRACE: Duration = Duration::from_millis(200);

/// Failure modes of a subprocess invocation.
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("no command configured")]
    EmptyCommand,

    #[error("failed to start `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("I/O error talking to `{program}`: {source}")]
    Io {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("`{program}` did not finish within {}s", .after.as_secs_f32())]
    TimedOut { program: String, after: Duration },

    #[error("`{program}` exited with {status}{}", stderr_suffix(.stderr))]
    Failed {
        program: String,
        status: String,
        stderr: String,
    },
}

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() {
        String::new()
    } else {
        format!(": {stderr}")
    }
}

/// Captured output of a successful run.
pub struct ProcessOutput {
    /// Data output. Wiped on drop since it may hold decrypted plaintext.
    pub stdout: Zeroizing<Vec<u8>>,
    /// Diagnostic output, kept apart from `stdout`.
    pub stderr: Vec<u8>,
}

/// Kills and reaps the child unless it has already been waited on.
struct ChildGuard {
    child: Child,
    reaped: bool,
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        if !self.reaped {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

/// Run `argv`, feed it `input` on stdin, and capture its stdout.
///
/// Succeeds only when the child exits with status 0 and its stdout
/// reaches end-of-file, both within `timeout`.
pub fn run(
    argv: &[String],
    input: &[u8],
    timeout: Duration,
) -> std::result::Result<ProcessOutput, ProcessError> {
    execute(argv, input, timeout, true)
}

/// Like `run`, but the child's stdout goes to the null device.
///
/// For helpers such as `xclip` that leave a background process behind:
/// only the exit status is waited for.
pub fn run_discarding_stdout(
    argv: &[String],
    input: &[u8],
    timeout: Duration,
) -> std::result::Result<ProcessOutput, ProcessError> {
    execute(argv, input, timeout, false)
}

fn execute(
    argv: &[String],
    input: &[u8],
    timeout: Duration,
    capture_stdout: bool,
) -> std::result::Result<ProcessOutput, ProcessError> {
    let (program, args) = argv.split_first().ok_or(ProcessError::EmptyCommand)?;
    let program = program.clone();

    tracing::debug!(%program, args = args.len(), ?timeout, "spawning subprocess");

    let stdout_cfg = if capture_stdout {
        Stdio::piped()
    } else {
        Stdio::null()
    };
    let child = Command::new(&program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(stdout_cfg)
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|source| ProcessError::Spawn {
            program: program.clone(),
            source,
        })?;
    let mut guard = ChildGuard {
        child,
        reaped: false,
    };

    // Pump the pipes on helper threads so a chatty child can never block
    // on a full pipe while we are still writing its input. Each thread
    // reports on a channel, so we can stop waiting for a pipe that a
    // background grandchild keeps open.
    let stdin = guard.child.stdin.take();
    let input = Zeroizing::new(input.to_vec());
    let writer = spawn_pipe(move || {
        if let Some(mut stdin) = stdin {
            stdin.write_all(&input)?;
            stdin.flush()?;
        }
        Ok(())
    });
    let stdout_reader = guard.child.stdout.take().map(read_pipe);
    let stderr_reader = guard.child.stderr.take().map(read_pipe);

    let io_err = |source: io::Error| ProcessError::Io {
        program: program.clone(),
        source,
    };
    let timed_out = || ProcessError::TimedOut {
        program: program.clone(),
        after: timeout,
    };

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = guard.child.try_wait().map_err(io_err)? {
            break status;
        }
        if Instant::now() >= deadline {
            tracing::warn!(%program, ?timeout, "subprocess timed out, killing it");
            // The guard kills and reaps. Pipe threads are abandoned and
            // finish on their own once the pipes close.
            drop(guard);
            return Err(timed_out());
        }
        thread::sleep(POLL_INTERVAL);
    };
    guard.reaped = true;

    // Captured stdout is the payload: it must be complete by the deadline.
    let stdout = match stdout_reader {
        Some(rx) => match recv_by(&rx, deadline) {
            Some(result) => Zeroizing::new(result.map_err(io_err)?),
            None => {
                tracing::warn!(%program, "stdout still open after exit, giving up");
                return Err(timed_out());
            }
        },
        None => Zeroizing::new(Vec::new()),
    };

    // The child itself has exited; whatever still holds stderr or stdin
    // is a background process we do not wait for.
    let grace = (Instant::now() + PIPE_GRACE).min(deadline);
    let stderr = match stderr_reader {
        Some(rx) => match recv_by(&rx, grace) {
            Some(result) => result.map_err(io_err)?,
            None => {
                tracing::debug!(%program, "stderr left open by a background process");
                Vec::new()
            }
        },
        None => Vec::new(),
    };
    let write_result = recv_by(&writer, grace);

    if !stderr.is_empty() {
        tracing::debug!(
            %program,
            stderr = %String::from_utf8_lossy(&stderr).trim(),
            "subprocess diagnostics"
        );
    }

    if !status.success() {
        let status = match status.code() {
            Some(code) => format!("code {code}"),
            None => "a signal".to_string(),
        };
        return Err(ProcessError::Failed {
            program: program.clone(),
            status,
            stderr: String::from_utf8_lossy(&stderr).trim().to_string(),
        });
    }

    // A child that exits 0 without draining stdin is its own business.
    if let Some(Err(e)) = write_result {
        if e.kind() != io::ErrorKind::BrokenPipe {
            return Err(io_err(e));
        }
    }

    tracing::debug!(%program, stdout_len = stdout.len(), "subprocess finished");
    Ok(ProcessOutput { stdout, stderr })
}

type PipeResult<T> = Receiver<io::Result<T>>;

fn spawn_pipe<T, F>(work: F) -> PipeResult<T>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        // The receiver may be gone if we stopped waiting.
        let _ = tx.send(work());
    });
    rx
}

fn read_pipe<R: Read + Send + 'static>(mut pipe: R) -> PipeResult<Vec<u8>> {
    spawn_pipe(move || {
        let mut buf = Vec::new();
        pipe.read_to_end(&mut buf)?;
        Ok(buf)
    })
}

/// Wait for a pipe thread until `deadline`. `None` means it is still busy.
fn recv_by<T>(rx: &PipeResult<T>, deadline: Instant) -> Option<io::Result<T>> {
    let wait = deadline.saturating_duration_since(Instant::now());
    match rx.recv_timeout(wait) {
        Ok(result) => Some(result),
        Err(RecvTimeoutError::Timeout) => None,
        Err(RecvTimeoutError::Disconnected) => Some(Err(io::Error::new(
            io::ErrorKind::Other,
            "pipe thread panicked",
        ))),
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| (*s).to_string()).collect()
    }

    const TIMEOUT: Duration = Duration::from_secs(10);

    #[test]
    fn run_pipes_input_through() {
        let out = run(&argv(&["cat"]), b"h\xc3\xa9llo\n", TIMEOUT).unwrap();
        assert_eq!(out.stdout.as_slice(), b"h\xc3\xa9llo\n");
        assert!(out.stderr.is_empty());
    }

    #[test]
    fn stderr_is_kept_out_of_stdout() {
        let out = run(
            &argv(&["sh", "-c", "echo warning >&2; cat"]),
            b"data",
            TIMEOUT,
        )
        .unwrap();
        assert_eq!(out.stdout.as_slice(), b"data");
        assert_eq!(out.stderr, b"warning\n");
    }

    #[test]
    fn nonzero_exit_is_failure_with_stderr() {
        let err = run(&argv(&["sh", "-c", "echo bad key >&2; exit 2"]), b"", TIMEOUT)
            .err()
            .unwrap();
        match err {
            ProcessError::Failed { status, stderr, .. } => {
                assert_eq!(status, "code 2");
                assert_eq!(stderr, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let err = run(&argv(&["credvault-no-such-program"]), b"", TIMEOUT)
            .err()
            .unwrap();
        assert!(matches!(err, ProcessError::Spawn { .. }));
    }

    #[test]
    fn empty_argv_is_rejected() {
        let err = run(&[], b"", TIMEOUT).err().unwrap();
        assert!(matches!(err, ProcessError::EmptyCommand));
    }

    #[test]
    fn slow_child_times_out() {
        let started = Instant::now();
        let err = run(&argv(&["sleep", "5"]), b"", Duration::from_millis(200))
            .err()
            .unwrap();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn background_holder_of_stdout_times_out() {
        let started = Instant::now();
        let err = run(
            &argv(&["sh", "-c", "cat; sleep 6 &"]),
            b"plain",
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProcessError::TimedOut { .. }));
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn discarded_stdout_does_not_wait_for_background_children() {
        let started = Instant::now();
        let out = run_discarding_stdout(
            &argv(&["sh", "-c", "cat >/dev/null; sleep 6 &"]),
            b"secret",
            Duration::from_secs(1),
        )
        .unwrap();
        assert!(out.stdout.is_empty());
        assert!(started.elapsed() < Duration::from_secs(4));
    }

    #[test]
    fn discarded_stdout_still_reports_failure() {
        let err = run_discarding_stdout(
            &argv(&["sh", "-c", "echo no display >&2; exit 1"]),
            b"x",
            TIMEOUT,
        )
        .err()
        .unwrap();
        assert!(matches!(err, ProcessError::Failed { ref stderr, .. } if stderr == "no display"));
    }

    #[test]
    fn large_input_does_not_deadlock() {
        let input = vec![b'x'; 1024 * 1024];
        let out = run(&argv(&["cat"]), &input, TIMEOUT).unwrap();
        assert_eq!(out.stdout.len(), input.len());
    }
}
