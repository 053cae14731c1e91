// src/pipeline/mod.rs

//! Ordered execution of configured steps.
//!
//! Each step is an [`Executor`] plus its argument template. Steps run one
//! after another; output captured by a foreground step (via its out/err
//! placeholder) is substituted into the arguments of every later step. A
//! failing foreground step stops the pipeline. Background steps are started
//! and left running; [`Pipeline::wait_background`] waits for them.

pub mod placeholders;

use std::path::Path;

use tracing::{debug, info};

use crate::config::{ConfigFile, ResolvedStep, SinkSpec};
use crate::errors::{Result, RunError};
use crate::exec::{Background, Executor, RunFuture, Runner, Sink};

pub use placeholders::Placeholders;

/// One configured command invocation.
#[derive(Debug, Clone)]
pub struct Step {
    pub name: String,
    pub executor: Executor,
    pub args: Vec<String>,
    pub out_placeholder: Option<String>,
    pub err_placeholder: Option<String>,
}

impl Step {
    pub fn new(name: impl Into<String>, executor: Executor, args: Vec<String>) -> Self {
        Self {
            name: name.into(),
            executor,
            args,
            out_placeholder: None,
            err_placeholder: None,
        }
    }

    /// Capture stdout and publish it under `token`.
    pub fn with_out_placeholder(mut self, token: &str) -> Self {
        self.executor = self.executor.out_placeholder(token);
        self.out_placeholder = (!token.is_empty()).then(|| token.to_string());
        self
    }

    /// Capture stderr and publish it under `token`.
    pub fn with_err_placeholder(mut self, token: &str) -> Self {
        self.executor = self.executor.err_placeholder(token);
        self.err_placeholder = (!token.is_empty()).then(|| token.to_string());
        self
    }

    /// Build a step from config, resolving relative paths against `root`.
    pub fn from_resolved(step: &ResolvedStep, root: &Path) -> Result<Self> {
        let mut executor = Executor::new(step.cmd.clone())
            .foreground(step.foreground)
            .stdout(open_sink(&step.name, "stdout", &step.stdout, root)?);

        if let Some(dir) = &step.directory {
            executor = executor.directory(root.join(dir));
        }
        if let Some(timeout) = step.timeout {
            executor = executor.timeout(timeout);
        }
        if let Some(spec) = &step.stderr {
            executor = executor.stderr(open_sink(&step.name, "stderr", spec, root)?);
        }

        let mut built = Step::new(step.name.clone(), executor, step.args.clone());
        if let Some(token) = &step.out_placeholder {
            built = built.with_out_placeholder(token);
        }
        if let Some(token) = &step.err_placeholder {
            built = built.with_err_placeholder(token);
        }
        Ok(built)
    }
}

fn open_sink(step: &str, field: &str, spec: &SinkSpec, root: &Path) -> Result<Sink> {
    spec.open(root).map_err(|e| {
        RunError::ConfigError(format!("step '{step}': cannot open {field} sink '{spec}': {e}"))
    })
}

/// Steps plus the tracker shared by their background invocations.
#[derive(Debug, Default)]
pub struct Pipeline {
    steps: Vec<Step>,
    background: Background,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step. Its background invocations are tracked by this
    /// pipeline.
    pub fn push(&mut self, mut step: Step) {
        step.executor = step.executor.track_background(self.background.clone());
        self.steps.push(step);
    }

    pub fn with_step(mut self, step: Step) -> Self {
        self.push(step);
        self
    }

    pub fn from_config(cfg: &ConfigFile, root: &Path) -> Result<Self> {
        let mut pipeline = Pipeline::new();
        for step in cfg.steps.iter() {
            pipeline.push(Step::from_resolved(step, root)?);
        }
        Ok(pipeline)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    /// Run every step in order and return the placeholder values collected.
    pub async fn execute(&self) -> Result<Placeholders> {
        let mut placeholders = Placeholders::new();

        for step in self.steps.iter() {
            let args = placeholders.substitute_all(&step.args);
            info!(
                step = %step.name,
                foreground = step.executor.is_foreground(),
                "running step"
            );

            let (stdout, stderr) = step.executor.run(&args).await.into_result()?;

            if let Some(token) = &step.out_placeholder {
                debug!(step = %step.name, token = %token, bytes = stdout.len(), "captured stdout");
                placeholders.set(token, &stdout);
            }
            if let Some(token) = &step.err_placeholder {
                debug!(step = %step.name, token = %token, bytes = stderr.len(), "captured stderr");
                placeholders.set(token, &stderr);
            }
        }

        Ok(placeholders)
    }

    /// Wait for background steps started by [`execute`](Self::execute).
    pub async fn wait_background(&self) {
        self.background.drain().await;
    }
}

impl Runner for Pipeline {
    fn run(&self) -> RunFuture<'_> {
        Box::pin(async move {
            self.execute().await?;
            Ok(())
        })
    }
}
