// src/errors.rs

//! Crate-wide error type and result alias.

use std::process::ExitStatus;
use std::time::Duration;

use thiserror::Error;

use crate::exec::Stream;

#[derive(Error, Debug)]
pub enum RunError {
    /// The process could not be spawned (missing executable, bad working
    /// directory, permission denied, ...).
    #[error("failed to start `{command}`: {source}")]
    Start {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// The process ran but exited non-zero or was terminated by a signal.
    #[error("`{command}` failed: {status}")]
    Exit { command: String, status: ExitStatus },

    /// The process was killed because its deadline elapsed.
    #[error("`{command}` exceeded its timeout of {timeout:?} and was killed{}", killed_suffix(.status))]
    TimedOut {
        command: String,
        timeout: Duration,
        status: Option<ExitStatus>,
    },

    /// Waiting on a started process failed at the OS level.
    #[error("failed to wait for `{command}`: {source}")]
    Wait {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Delivering child output to a sink failed.
    #[error("writing {stream} of child process: {source}")]
    Output {
        stream: Stream,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RunError {
    /// True when the process was terminated by its configured timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, RunError::TimedOut { .. })
    }

    /// Exit status of the child, when one was observed.
    pub fn exit_status(&self) -> Option<ExitStatus> {
        match self {
            RunError::Exit { status, .. } => Some(*status),
            RunError::TimedOut { status, .. } => *status,
            _ => None,
        }
    }
}

fn killed_suffix(status: &Option<ExitStatus>) -> String {
    match status {
        Some(status) => format!(" ({status})"),
        None => String::new(),
    }
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, RunError>;
