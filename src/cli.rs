// src/cli.rs

//! CLI argument parsing using `clap`.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::config::parse_duration;

/// Command-line arguments for `runcmd`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runcmd",
    version,
    about = "Run external commands with timeouts, output capture and structured logs.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Ignored when a command is given after `--`.
    #[arg(long, value_name = "PATH", default_value = "Runcmd.toml")]
    pub config: String,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNCMD_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the steps, but don't execute anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Working directory for an ad-hoc command.
    #[arg(long, value_name = "DIR")]
    pub dir: Option<String>,

    /// Timeout for an ad-hoc command, e.g. `500ms`, `30s`, `2m`.
    #[arg(long, value_name = "DURATION", value_parser = parse_duration)]
    pub timeout: Option<Duration>,

    /// Start an ad-hoc command in the background.
    ///
    /// The CLI still waits for it before exiting; only the return path
    /// changes (no exit error is reported).
    #[arg(long)]
    pub background: bool,

    /// Ad-hoc command and its arguments, e.g. `runcmd -- ls -la`.
    #[arg(last = true, value_name = "COMMAND")]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
