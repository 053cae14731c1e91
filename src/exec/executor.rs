// src/exec/executor.rs

//! The command executor.
//!
//! One call to [`Executor::run`] is one invocation:
//!
//! 1. build the process description and bind its output streams,
//! 2. arm the deadline (if a timeout is configured),
//! 3. spawn the child,
//! 4. wait for it, release the deadline, and log the outcome exactly once.
//!
//! Step 4 is the same future in both modes. Foreground awaits it inline;
//! background spawns it as a detached Tokio task and returns right after the
//! start attempt.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use anyhow::anyhow;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::errors::{Result, RunError};
use crate::exec::background::Background;
use crate::exec::deadline::Deadline;
use crate::exec::fanout::FanOut;
use crate::exec::outcome::{InvocationLog, RunOutput};
use crate::exec::pump::{Stream, spawn_pump};
use crate::exec::sink::{SharedBuffer, Sink};

/// Configuration for running one external program.
///
/// Defaults: foreground, no timeout, no capture, stdout and stderr both
/// streamed to the current process's stdout, working directory inherited.
#[derive(Debug, Clone)]
pub struct Executor {
    program: String,
    directory: Option<PathBuf>,
    foreground: bool,
    timeout: Option<Duration>,
    capture_stdout: bool,
    capture_stderr: bool,
    stdout: Sink,
    stderr: Option<Sink>,
    background: Option<Background>,
}

impl Executor {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            directory: None,
            foreground: true,
            timeout: None,
            capture_stdout: false,
            capture_stderr: false,
            stdout: Sink::stdout(),
            stderr: None,
            background: None,
        }
    }

    /// Working directory of the child. An empty path means "inherit".
    pub fn directory(mut self, dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        self.directory = if dir.as_os_str().is_empty() {
            None
        } else {
            Some(dir.to_path_buf())
        };
        self
    }

    pub fn foreground(mut self, foreground: bool) -> Self {
        self.foreground = foreground;
        self
    }

    /// Wall-clock limit for the invocation. Zero disables the limit.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Capture stdout iff `placeholder` is non-empty.
    pub fn out_placeholder(self, placeholder: &str) -> Self {
        self.capture_stdout(!placeholder.is_empty())
    }

    /// Capture stderr iff `placeholder` is non-empty.
    pub fn err_placeholder(self, placeholder: &str) -> Self {
        self.capture_stderr(!placeholder.is_empty())
    }

    pub fn capture_stdout(mut self, capture: bool) -> Self {
        self.capture_stdout = capture;
        self
    }

    pub fn capture_stderr(mut self, capture: bool) -> Self {
        self.capture_stderr = capture;
        self
    }

    /// Primary sink: receives stdout, and stderr too unless a separate
    /// error sink is set.
    ///
    /// When both streams share this sink they are still read from two
    /// pipes. Each stream keeps its own byte order and every chunk lands
    /// whole, but how stdout and stderr chunks interleave depends on when
    /// the pumps read them, not on the order the child wrote them.
    pub fn stdout(mut self, sink: Sink) -> Self {
        self.stdout = sink;
        self
    }

    pub fn stderr(mut self, sink: Sink) -> Self {
        self.stderr = Some(sink);
        self
    }

    /// Register detached background invocations with `tracker`.
    pub fn track_background(mut self, tracker: Background) -> Self {
        self.background = Some(tracker);
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn is_foreground(&self) -> bool {
        self.foreground
    }

    pub fn timeout_duration(&self) -> Option<Duration> {
        self.timeout
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    /// Run the program with `args`.
    ///
    /// Foreground: returns once the child has exited and the completion
    /// record has been logged. Background: returns right after the start
    /// attempt with empty captures; only a start failure is reported.
    pub async fn run<S: AsRef<str>>(&self, args: &[S]) -> RunOutput {
        let args: Vec<String> = args.iter().map(|a| a.as_ref().to_string()).collect();
        let log = InvocationLog::begin(&self.program, &args);

        let deadline = self
            .timeout
            .and_then(|timeout| Deadline::arm(timeout, log.started_at()));

        let stdout_capture = self.capture_stdout.then(SharedBuffer::default);
        let stderr_capture = self.capture_stderr.then(SharedBuffer::default);

        debug!(
            command = ?log.command(),
            directory = ?self.directory,
            foreground = self.foreground,
            timeout = ?self.timeout,
            "starting command"
        );

        let started = self
            .build_command(&args)
            .spawn()
            .map(|child| self.attach(child, &stdout_capture, &stderr_capture))
            .map_err(|source| RunError::Start {
                command: self.program.clone(),
                source,
            });

        let invocation = Invocation {
            program: self.program.clone(),
            started,
            deadline,
            stdout_capture,
            stderr_capture,
            log,
        };

        // A failed start has nothing to wait on, so the wait step finishes
        // immediately and its error goes straight back to the caller.
        if self.foreground || invocation.started.is_err() {
            return invocation.wait_and_log().await;
        }

        let handle = tokio::spawn(async move {
            let _ = invocation.wait_and_log().await;
        });
        if let Some(tracker) = &self.background {
            tracker.track(handle);
        }

        RunOutput::detached(Ok(()))
    }

    fn build_command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.directory {
            cmd.current_dir(dir);
        }
        cmd
    }

    /// Hook the child's pipes up to the sinks (and capture buffers).
    fn attach(
        &self,
        mut child: Child,
        stdout_capture: &Option<SharedBuffer>,
        stderr_capture: &Option<SharedBuffer>,
    ) -> Running {
        let mut pumps = Vec::with_capacity(2);

        if let Some(pipe) = child.stdout.take() {
            let writer = fan_out(self.stdout.clone(), stdout_capture);
            pumps.push((Stream::Stdout, spawn_pump(Stream::Stdout, pipe, writer)));
        }

        // Falls back to the primary sink; see `stdout` for ordering.
        if let Some(pipe) = child.stderr.take() {
            let sink = self.stderr.clone().unwrap_or_else(|| self.stdout.clone());
            let writer = fan_out(sink, stderr_capture);
            pumps.push((Stream::Stderr, spawn_pump(Stream::Stderr, pipe, writer)));
        }

        Running { child, pumps }
    }
}

fn fan_out(sink: Sink, capture: &Option<SharedBuffer>) -> FanOut {
    let writer = FanOut::new().with(sink);
    match capture {
        Some(buffer) => writer.with(buffer.clone()),
        None => writer,
    }
}

/// Everything one invocation owns between the start attempt and the
/// completion log.
struct Invocation {
    program: String,
    started: Result<Running>,
    deadline: Option<Deadline>,
    stdout_capture: Option<SharedBuffer>,
    stderr_capture: Option<SharedBuffer>,
    log: InvocationLog,
}

impl Invocation {
    async fn wait_and_log(self) -> RunOutput {
        let Invocation {
            program,
            started,
            mut deadline,
            stdout_capture,
            stderr_capture,
            log,
        } = self;

        let result = match started {
            Ok(running) => running.wait(&program, deadline.as_mut()).await,
            Err(start_error) => Err(start_error),
        };

        // Completion signal: the guard stops watching only now that the
        // outcome is known.
        if let Some(deadline) = deadline {
            deadline.release();
        }

        let output = RunOutput {
            stdout: captured_text(stdout_capture),
            stderr: captured_text(stderr_capture),
            result,
        };

        log.finish(&output.result);
        output
    }
}

fn captured_text(capture: Option<SharedBuffer>) -> String {
    capture.map(|buffer| buffer.text()).unwrap_or_default()
}

/// A successfully spawned child and its output pumps.
struct Running {
    child: Child,
    pumps: Vec<(Stream, JoinHandle<io::Result<u64>>)>,
}

enum Waited {
    Exited(io::Result<ExitStatus>),
    Killed {
        timeout: Duration,
        status: io::Result<ExitStatus>,
    },
}

impl Running {
    async fn wait(mut self, program: &str, deadline: Option<&mut Deadline>) -> Result<()> {
        let waited = match deadline {
            Some(deadline) => {
                tokio::select! {
                    status = self.child.wait() => Waited::Exited(status),
                    () = deadline.expired() => {
                        debug!(command = program, timeout = ?deadline.timeout(), "timeout elapsed; killing process");
                        if let Err(e) = self.child.start_kill() {
                            warn!(command = program, error = %e, "failed to kill timed-out process");
                        }
                        Waited::Killed {
                            timeout: deadline.timeout(),
                            status: self.child.wait().await,
                        }
                    }
                }
            }
            None => Waited::Exited(self.child.wait().await),
        };

        // The pipes close when the child exits; join the pumps so every byte
        // it wrote has reached the sinks before we report.
        let copy_error = join_pumps(self.pumps).await;

        match waited {
            Waited::Exited(Err(source)) => Err(RunError::Wait {
                command: program.to_string(),
                source,
            }),
            Waited::Exited(Ok(status)) if !status.success() => Err(RunError::Exit {
                command: program.to_string(),
                status,
            }),
            Waited::Killed { timeout, status } => Err(RunError::TimedOut {
                command: program.to_string(),
                timeout,
                status: status.ok(),
            }),
            Waited::Exited(Ok(_)) => match copy_error {
                Some(err) => Err(err),
                None => Ok(()),
            },
        }
    }
}

/// Wait for all pumps; return the first failure, if any.
async fn join_pumps(pumps: Vec<(Stream, JoinHandle<io::Result<u64>>)>) -> Option<RunError> {
    let mut first_error = None;
    for (stream, pump) in pumps {
        let err = match pump.await {
            Ok(Ok(_copied)) => continue,
            Ok(Err(source)) => RunError::Output { stream, source },
            Err(join_err) => RunError::Other(anyhow!("{stream} pump task failed: {join_err}")),
        };
        if first_error.is_none() {
            first_error = Some(err);
        }
    }
    first_error
}
