// src/config/model.rs

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::config::duration::parse_duration;
use crate::config::validate::validate_config;
use crate::errors::{Result, RunError};
use crate::exec::Sink;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [defaults]
/// directory = "."
/// timeout = "30s"
///
/// [[step]]
/// cmd = "git"
/// args = ["rev-parse", "HEAD"]
/// out_placeholder = "{rev}"
///
/// [[step]]
/// cmd = "echo"
/// args = ["built {rev}"]
/// ```
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawConfigFile {
    /// Values every step inherits unless it sets its own.
    #[serde(default)]
    pub defaults: DefaultsSection,

    /// Steps in execution order, from `[[step]]` tables.
    #[serde(default)]
    pub step: Vec<StepConfig>,
}

/// `[defaults]` section.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct DefaultsSection {
    /// Working directory, relative to the config file's directory.
    #[serde(default)]
    pub directory: Option<String>,

    /// Duration string such as `"30s"`; `"0s"` disables the timeout.
    #[serde(default)]
    pub timeout: Option<String>,

    /// Run steps in the foreground (default `true`).
    #[serde(default)]
    pub foreground: Option<bool>,

    /// `stdout`, `stderr`, `null`, or a file path. Default `stdout`.
    #[serde(default)]
    pub stdout: Option<String>,

    /// Separate error sink. When unset, stderr shares the stdout sink.
    #[serde(default)]
    pub stderr: Option<String>,
}

/// `[[step]]` table.
#[derive(Debug, Clone, Deserialize)]
pub struct StepConfig {
    /// Display name; defaults to `cmd`.
    #[serde(default)]
    pub name: Option<String>,

    /// Executable to launch (looked up on `PATH` when not a path).
    pub cmd: String,

    #[serde(default)]
    pub args: Vec<String>,

    #[serde(default)]
    pub directory: Option<String>,

    #[serde(default)]
    pub timeout: Option<String>,

    #[serde(default)]
    pub foreground: Option<bool>,

    #[serde(default)]
    pub stdout: Option<String>,

    #[serde(default)]
    pub stderr: Option<String>,

    /// Capture stdout and substitute it for this token in later steps.
    #[serde(default)]
    pub out_placeholder: Option<String>,

    /// Capture stderr and substitute it for this token in later steps.
    #[serde(default)]
    pub err_placeholder: Option<String>,
}

impl StepConfig {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.cmd)
    }

    pub fn effective_foreground(&self, defaults: &DefaultsSection) -> bool {
        self.foreground.or(defaults.foreground).unwrap_or(true)
    }

    /// Non-empty out placeholder, if any.
    pub fn out_token(&self) -> Option<&str> {
        self.out_placeholder.as_deref().filter(|p| !p.is_empty())
    }

    /// Non-empty err placeholder, if any.
    pub fn err_token(&self) -> Option<&str> {
        self.err_placeholder.as_deref().filter(|p| !p.is_empty())
    }
}

/// Where a step's output goes, as written in the config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkSpec {
    Stdout,
    Stderr,
    Null,
    File(PathBuf),
}

impl SinkSpec {
    /// Open the destination; relative file paths resolve against `root`.
    pub fn open(&self, root: &Path) -> io::Result<Sink> {
        match self {
            SinkSpec::Stdout => Ok(Sink::stdout()),
            SinkSpec::Stderr => Ok(Sink::stderr()),
            SinkSpec::Null => Ok(Sink::null()),
            SinkSpec::File(path) => Sink::file(root.join(path)),
        }
    }
}

impl FromStr for SinkSpec {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "" => Err("sink must not be empty".to_string()),
            "stdout" => Ok(SinkSpec::Stdout),
            "stderr" => Ok(SinkSpec::Stderr),
            "null" => Ok(SinkSpec::Null),
            path => Ok(SinkSpec::File(PathBuf::from(path))),
        }
    }
}

impl fmt::Display for SinkSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkSpec::Stdout => f.write_str("stdout"),
            SinkSpec::Stderr => f.write_str("stderr"),
            SinkSpec::Null => f.write_str("null"),
            SinkSpec::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A step with defaults applied and strings parsed.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedStep {
    pub name: String,
    pub cmd: String,
    pub args: Vec<String>,
    /// Relative to the config root when not absolute.
    pub directory: Option<PathBuf>,
    pub timeout: Option<Duration>,
    pub foreground: bool,
    pub stdout: SinkSpec,
    pub stderr: Option<SinkSpec>,
    pub out_placeholder: Option<String>,
    pub err_placeholder: Option<String>,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub steps: Vec<ResolvedStep>,
}

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = RunError;

    fn try_from(raw: RawConfigFile) -> Result<Self> {
        validate_config(&raw)?;

        let steps = raw
            .step
            .iter()
            .map(|step| resolve_step(step, &raw.defaults))
            .collect::<Result<Vec<_>>>()?;

        Ok(ConfigFile { steps })
    }
}

fn resolve_step(step: &StepConfig, defaults: &DefaultsSection) -> Result<ResolvedStep> {
    let name = step.display_name().to_string();

    let timeout = match step.timeout.as_ref().or(defaults.timeout.as_ref()) {
        Some(s) => {
            let dur = parse_duration(s)
                .map_err(|e| RunError::ConfigError(format!("step '{name}': timeout: {e}")))?;
            (!dur.is_zero()).then_some(dur)
        }
        None => None,
    };

    let stdout = match step.stdout.as_ref().or(defaults.stdout.as_ref()) {
        Some(s) => parse_sink(&name, "stdout", s)?,
        None => SinkSpec::Stdout,
    };

    let stderr = step
        .stderr
        .as_ref()
        .or(defaults.stderr.as_ref())
        .map(|s| parse_sink(&name, "stderr", s))
        .transpose()?;

    let directory = step
        .directory
        .as_ref()
        .or(defaults.directory.as_ref())
        .filter(|d| !d.is_empty())
        .map(PathBuf::from);

    Ok(ResolvedStep {
        cmd: step.cmd.clone(),
        args: step.args.clone(),
        directory,
        timeout,
        foreground: step.effective_foreground(defaults),
        stdout,
        stderr,
        out_placeholder: step.out_token().map(str::to_string),
        err_placeholder: step.err_token().map(str::to_string),
        name,
    })
}

fn parse_sink(step: &str, field: &str, value: &str) -> Result<SinkSpec> {
    value
        .parse()
        .map_err(|e| RunError::ConfigError(format!("step '{step}': {field}: {e}")))
}
