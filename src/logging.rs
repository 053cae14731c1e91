// src/logging.rs

//! Log subscriber for the `runcmd` binary.
//!
//! Filtering is expressed as `EnvFilter` directives:
//! - `RUNCMD_LOG` may hold any directive list, e.g. `warn,runcmd::exit=info`
//!   to silence everything except the per-invocation completion records.
//! - `--log-level` sets the global level and wins over a global level in
//!   `RUNCMD_LOG`; per-target directives from the environment still apply.
//! - With neither, the global level is `info`.
//!
//! Logs go to STDERR so the default stdout sink carries only child output.

use anyhow::Result;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;

use crate::cli::LogLevel;

/// Environment variable holding extra filter directives.
pub const LOG_ENV: &str = "RUNCMD_LOG";

/// Install the global subscriber. Call once at startup.
pub fn init_logging(cli_level: Option<LogLevel>) -> Result<()> {
    let env = std::env::var(LOG_ENV).ok();
    let filter = build_filter(cli_level, env.as_deref());

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("installing log subscriber: {e}"))?;

    Ok(())
}

/// Build the subscriber filter from the CLI level and `RUNCMD_LOG`.
///
/// Invalid directives in `env` are skipped.
pub fn build_filter(cli_level: Option<LogLevel>, env: Option<&str>) -> EnvFilter {
    EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .parse_lossy(filter_directives(cli_level, env))
}

/// Directive string handed to [`EnvFilter`].
///
/// Later directives for the same target replace earlier ones, so the
/// ordering is: `info` baseline, then the environment, then the CLI level.
pub fn filter_directives(cli_level: Option<LogLevel>, env: Option<&str>) -> String {
    let mut directives = vec![LevelFilter::INFO.to_string()];
    directives.extend(
        env.into_iter()
            .flat_map(|s| s.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string),
    );
    if let Some(level) = cli_level {
        directives.push(level_filter(level).to_string());
    }
    directives.join(",")
}

pub fn level_filter(level: LogLevel) -> LevelFilter {
    match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    }
}
