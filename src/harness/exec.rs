//! External command execution
//!
//! The harness never spawns processes directly. Every build, system-under-test
//! and comparison call goes through a [`CommandRunner`], which returns a
//! structured [`ExecResult`]. The harness currently only looks at the exit
//! code of the comparison, but the full result is kept so failure detection
//! can be tightened without touching the run loop.
//!
//! ## Limits of [`ProcessRunner`]
//!
//! A timeout kills the direct child only. Processes it started in the
//! background keep running and may hold its stdout/stderr open. In
//! [`OutputMode::Capture`] the runner waits at most [`DRAIN_GRACE`] after the
//! child exits for those pipes to close, then gives up on whatever output is
//! still pending and returns with an empty stream.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver};
use std::thread;
use std::time::{Duration, Instant};

use wait_timeout::ChildExt;

use super::config::CommandSpec;
use super::error::ExecError;

/// How long captured pipes may stay open after the child has exited.
pub const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Where the child's stdout/stderr go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Pass straight through to the harness' console
    #[default]
    Inherit,
    /// Collect into [`ExecResult::stdout`] / [`ExecResult::stderr`]
    Capture,
}

/// A single external command to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: OsString,
    pub args: Vec<OsString>,
    pub output: OutputMode,
}

impl Invocation {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            output: OutputMode::default(),
        }
    }

    pub fn from_spec(spec: &CommandSpec) -> Self {
        Self::new(spec.program.clone()).args(spec.args.iter().cloned())
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn output(mut self, mode: OutputMode) -> Self {
        self.output = mode;
        self
    }

    /// Lossy program name for logs and errors.
    pub fn program_name(&self) -> String {
        self.program.to_string_lossy().into_owned()
    }
}

/// What an external command did.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExecResult {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    /// Empty unless the invocation used [`OutputMode::Capture`]
    pub stdout: String,
    pub stderr: String,
    pub duration: Duration,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Runs external commands on behalf of the harness.
///
/// Implement this trait to mock process execution in tests or to run
/// commands somewhere other than the local machine.
pub trait CommandRunner {
    /// Run `invocation` to completion and report what happened.
    fn run(&self, invocation: &Invocation) -> Result<ExecResult, ExecError>;
}

/// Spawns local processes and blocks until they exit.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    fn wait(&self, child: &mut std::process::Child, program: &str) -> Result<ExitStatus, ExecError> {
        let wait_err = |source: std::io::Error| ExecError::Wait {
            program: program.to_string(),
            source,
        };

        let Some(timeout) = self.timeout else {
            return child.wait().map_err(wait_err);
        };

        match child.wait_timeout(timeout).map_err(wait_err)? {
            Some(status) => Ok(status),
            None => {
                let _ = child.kill();
                let _ = child.wait();
                Err(ExecError::Timeout {
                    program: program.to_string(),
                    timeout,
                })
            }
        }
    }
}

impl CommandRunner for ProcessRunner {
    fn run(&self, invocation: &Invocation) -> Result<ExecResult, ExecError> {
        let program = invocation.program_name();
        tracing::debug!(program = %program, args = ?invocation.args, "running command");

        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args);
        if invocation.output == OutputMode::Capture {
            cmd.stdout(Stdio::piped());
            cmd.stderr(Stdio::piped());
        }

        let start = Instant::now();
        let mut child = cmd.spawn().map_err(|source| ExecError::Spawn {
            program: program.clone(),
            source,
        })?;

        // Drain pipes on separate threads so a chatty child cannot block on a full pipe
        let stdout = child.stdout.take().map(spawn_drain);
        let stderr = child.stderr.take().map(spawn_drain);

        let status = self.wait(&mut child, &program)?;
        let duration = start.elapsed();

        let deadline = Instant::now() + DRAIN_GRACE;
        let stdout = collect(stdout, deadline, &program, "stdout");
        let stderr = collect(stderr, deadline, &program, "stderr");

        tracing::debug!(program = %program, code = ?status.code(), ms = duration.as_millis(), "command finished");

        Ok(ExecResult {
            exit_code: status.code(),
            stdout,
            stderr,
            duration,
        })
    }
}

fn spawn_drain(stream: impl Read + Send + 'static) -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(drain(stream));
    });
    rx
}

/// Wait for a drain thread until `deadline`. A pipe still held open by a
/// leftover grandchild yields an empty string; its thread is left to finish
/// on its own.
fn collect(rx: Option<Receiver<String>>, deadline: Instant, program: &str, stream: &str) -> String {
    let Some(rx) = rx else {
        return String::new();
    };
    match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
        Ok(text) => text,
        Err(_) => {
            tracing::warn!(program = %program, "{} still open after the command exited; output dropped", stream);
            String::new()
        }
    }
}

fn drain(mut stream: impl Read) -> String {
    let mut buf = Vec::new();
    let _ = stream.read_to_end(&mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}
