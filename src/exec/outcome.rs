// src/exec/outcome.rs

//! Invocation results and the per-invocation completion log.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{error, info};

use crate::errors::{Result, RunError};

/// Log target of the single completion record emitted per invocation.
pub const EXIT_LOG_TARGET: &str = "runcmd::exit";

/// What a call to [`Executor::run`](crate::exec::Executor::run) hands back.
///
/// Captures are empty unless capture was enabled for that stream, and always
/// empty for background invocations. On failure the captures still hold
/// whatever the child wrote before it ended.
#[derive(Debug)]
pub struct RunOutput {
    pub stdout: String,
    pub stderr: String,
    pub result: Result<()>,
}

impl RunOutput {
    pub(crate) fn detached(result: Result<()>) -> Self {
        Self {
            stdout: String::new(),
            stderr: String::new(),
            result,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result.is_ok()
    }

    pub fn error(&self) -> Option<&RunError> {
        self.result.as_ref().err()
    }

    /// Drop the captures on failure and return `(stdout, stderr)` on success.
    pub fn into_result(self) -> Result<(String, String)> {
        self.result.map(|()| (self.stdout, self.stderr))
    }
}

/// Immutable logging context for one invocation.
///
/// Built when the invocation starts and consumed by [`InvocationLog::finish`]
/// once the wait step has resolved.
#[derive(Debug, Clone)]
pub struct InvocationLog {
    command: Vec<String>,
    started_at: Instant,
}

impl InvocationLog {
    pub fn begin(program: &str, args: &[String]) -> Self {
        let mut command = Vec::with_capacity(args.len() + 1);
        command.push(program.to_string());
        command.extend(args.iter().cloned());
        Self {
            command,
            started_at: Instant::now(),
        }
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }

    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }

    /// Emit the completion record: `ERROR` with the error attached on
    /// failure, `INFO` otherwise.
    pub fn finish(self, result: &Result<()>) {
        let duration = self.elapsed();
        match result {
            Ok(()) => {
                info!(
                    target: EXIT_LOG_TARGET,
                    command = ?self.command,
                    ?duration,
                    "command finished"
                );
            }
            Err(err) => {
                error!(
                    target: EXIT_LOG_TARGET,
                    command = ?self.command,
                    ?duration,
                    error = %err,
                    "command failed"
                );
            }
        }
    }
}
