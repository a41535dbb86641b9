//! Script Supervisor
//!
//! Runs generated benchmark scripts as child processes. Output is captured on
//! reader threads so a chatty child never blocks on a full pipe; the supervisor
//! polls for exit so it can enforce a timeout and notice an interrupt.
//!
//! On Unix each script runs in its own process group, so pyperf's worker
//! processes can be stopped together with the script that spawned them. A
//! terminal Ctrl-C only reaches blackbench; the supervisor forwards it to the
//! script's group and gives the script a grace period to exit.

use std::ffi::OsString;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Poll interval while waiting for a child
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// How long an interrupted child gets to exit before it is killed
const INTERRUPT_GRACE: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("Failed to spawn `{program}`")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Interrupted")]
    Interrupted,
}

/// Global flag set by the SIGINT handler.
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Check whether an interrupt was received since the handler was installed.
pub fn interrupted() -> bool {
    INTERRUPTED.load(Ordering::Relaxed)
}

/// Install a SIGINT handler that sets the interrupt flag instead of exiting,
/// so the run can unwind and remove its working directory.
/// The handler is async-signal-safe (only sets an atomic).
///
/// Installing clears an interrupt recorded by an earlier run.
#[cfg(unix)]
pub fn install_interrupt_handler() {
    INTERRUPTED.store(false, Ordering::Relaxed);
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigint_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&mut sa.sa_mask);
        libc::sigaction(libc::SIGINT, &sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigint_handler(_sig: libc::c_int) {
    INTERRUPTED.store(true, Ordering::Relaxed);
}

/// Only clears the flag on non-Unix; Ctrl-C keeps its default behaviour there.
#[cfg(not(unix))]
pub fn install_interrupt_handler() {
    INTERRUPTED.store(false, Ordering::Relaxed);
}

/// Output of a finished script
#[derive(Debug)]
pub struct ScriptOutput {
    /// Exit status of the child
    pub status: ExitStatus,
    /// Captured standard output
    pub stdout: Vec<u8>,
    /// Captured standard error
    pub stderr: Vec<u8>,
    /// Wall-clock time from spawn to exit
    pub elapsed: Duration,
}

impl ScriptOutput {
    /// Whether the child exited with status 0
    pub fn success(&self) -> bool {
        self.status.success()
    }
}

/// Runs scripts with a fixed interpreter and optional timeout
#[derive(Debug, Clone)]
pub struct ScriptRunner {
    interpreter: PathBuf,
    timeout: Option<Duration>,
}

impl ScriptRunner {
    pub fn new(interpreter: impl Into<PathBuf>) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout: None,
        }
    }

    /// Kill scripts that run longer than `timeout`
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `<interpreter> <script> <args...>` to completion.
    ///
    /// A nonzero exit is not an error here; callers inspect
    /// [`ScriptOutput::status`].
    pub fn run_script<I, S>(&self, script: &Path, args: I) -> Result<ScriptOutput, SupervisorError>
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut command = Command::new(&self.interpreter);
        command.arg(script);
        command.args(args.into_iter().map(Into::into));
        self.run(command)
    }

    /// Check that `module` imports cleanly under the interpreter.
    pub fn check_import(&self, module: &str) -> Result<bool, SupervisorError> {
        let mut command = Command::new(&self.interpreter);
        command.arg("-c").arg(format!("import {}", module));
        let output = self.run(command)?;
        if !output.success() {
            tracing::debug!(
                "`import {}` failed: {}",
                module,
                String::from_utf8_lossy(&output.stderr).trim_end()
            );
        }
        Ok(output.success())
    }

    fn run(&self, mut command: Command) -> Result<ScriptOutput, SupervisorError> {
        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let start = Instant::now();
        let mut child = command.spawn().map_err(|source| SupervisorError::SpawnFailed {
            program: self.interpreter.display().to_string(),
            source,
        })?;
        tracing::debug!("Spawned pid {}: {:?}", child.id(), command);

        let stdout = child.stdout.take().map(capture);
        let stderr = child.stderr.take().map(capture);
        // On timeout or interrupt the readers are left detached: a worker that
        // moved to another process group may still hold the pipes open.
        let status = self.wait(&mut child, start);
        // Workers the script left behind must not compete with the next benchmark
        signal_group(&child, Signal::Kill);
        let status = status?;
        let stdout = join_capture(stdout);
        let stderr = join_capture(stderr);

        Ok(ScriptOutput {
            status,
            stdout,
            stderr,
            elapsed: start.elapsed(),
        })
    }

    fn wait(&self, child: &mut Child, start: Instant) -> Result<ExitStatus, SupervisorError> {
        let mut interrupted_at: Option<Instant> = None;
        loop {
            if let Some(status) = child.try_wait()? {
                if interrupted_at.is_some() || interrupted() {
                    return Err(SupervisorError::Interrupted);
                }
                return Ok(status);
            }

            if interrupted_at.is_none() && interrupted() {
                signal_group(child, Signal::Interrupt);
                interrupted_at = Some(Instant::now());
            }
            if let Some(at) = interrupted_at {
                if at.elapsed() >= INTERRUPT_GRACE {
                    kill(child);
                    return Err(SupervisorError::Interrupted);
                }
            } else if let Some(timeout) = self.timeout {
                if start.elapsed() >= timeout {
                    kill(child);
                    return Err(SupervisorError::Timeout(timeout));
                }
            }

            std::thread::sleep(POLL_INTERVAL);
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Interrupt,
    Kill,
}

/// Send `signal` to every process in the child's process group.
#[cfg(unix)]
fn signal_group(child: &Child, signal: Signal) {
    let signal = match signal {
        Signal::Interrupt => libc::SIGINT,
        Signal::Kill => libc::SIGKILL,
    };
    // The child leads its group, so its pid is the group id. ESRCH (group
    // already gone) is fine.
    unsafe {
        libc::killpg(child.id() as libc::pid_t, signal);
    }
}

#[cfg(not(unix))]
fn signal_group(_child: &Child, _signal: Signal) {}

fn kill(child: &mut Child) {
    signal_group(child, Signal::Kill);
    // Child may already be dead
    let _ = child.kill();
    let _ = child.wait();
}

fn capture<R: Read + Send + 'static>(mut pipe: R) -> JoinHandle<Vec<u8>> {
    std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = pipe.read_to_end(&mut buf);
        buf
    })
}

fn join_capture(handle: Option<JoinHandle<Vec<u8>>>) -> Vec<u8> {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}
