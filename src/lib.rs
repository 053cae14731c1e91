// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod pipeline;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::{ConfigFile, config_root_dir, load_and_validate};
use crate::exec::{Executor, Runner};
use crate::pipeline::{Pipeline, Step};

/// High-level entry point used by `main.rs`.
///
/// Either runs the ad-hoc command given after `--`, or loads the config file
/// and runs its steps in order. Background invocations are waited for before
/// returning so their output and completion logs are not lost when the
/// runtime shuts down.
pub async fn run(args: CliArgs) -> Result<()> {
    let pipeline = match args.command.split_first() {
        Some((program, rest)) => {
            let step = ad_hoc_step(&args, program, rest);
            if args.dry_run {
                println!("runcmd dry-run");
                print_step(&step.name, program, rest, &step.executor);
                return Ok(());
            }
            Pipeline::new().with_step(step)
        }
        None => {
            let config_path = PathBuf::from(&args.config);
            let cfg = load_and_validate(&config_path)
                .with_context(|| format!("loading config from {:?}", config_path))?;

            if args.dry_run {
                print_dry_run(&cfg);
                return Ok(());
            }

            Pipeline::from_config(&cfg, &config_root_dir(&config_path))?
        }
    };

    info!(steps = pipeline.steps().len(), "starting pipeline");
    run_to_completion(&pipeline).await
}

/// Run `pipeline` as a [`Runner`], then wait for its background invocations.
///
/// The runner's error is reported only after background work has drained.
pub async fn run_to_completion(pipeline: &Pipeline) -> Result<()> {
    let result = Runner::run(pipeline).await;
    pipeline.wait_background().await;
    result?;
    debug!("pipeline complete");
    Ok(())
}

fn ad_hoc_step(args: &CliArgs, program: &str, rest: &[String]) -> Step {
    let mut executor = Executor::new(program).foreground(!args.background);
    if let Some(dir) = &args.dir {
        executor = executor.directory(dir);
    }
    if let Some(timeout) = args.timeout {
        executor = executor.timeout(timeout);
    }
    Step::new(program, executor, rest.to_vec())
}

/// Simple dry-run output: print steps and their effective settings.
fn print_dry_run(cfg: &ConfigFile) {
    println!("runcmd dry-run");
    println!();
    println!("steps ({}):", cfg.steps.len());
    for step in cfg.steps.iter() {
        println!("  - {}", step.name);
        println!("      cmd: {} {:?}", step.cmd, step.args);
        if let Some(dir) = &step.directory {
            println!("      directory: {}", dir.display());
        }
        if let Some(timeout) = step.timeout {
            println!("      timeout: {timeout:?}");
        }
        if !step.foreground {
            println!("      background: true");
        }
        println!("      stdout: {}", step.stdout);
        if let Some(stderr) = &step.stderr {
            println!("      stderr: {stderr}");
        }
        if let Some(token) = &step.out_placeholder {
            println!("      out_placeholder: {token}");
        }
        if let Some(token) = &step.err_placeholder {
            println!("      err_placeholder: {token}");
        }
    }

    debug!("dry-run complete (no execution)");
}

fn print_step(name: &str, program: &str, args: &[String], executor: &Executor) {
    println!("  - {name}");
    println!("      cmd: {program} {args:?}");
    if let Some(dir) = executor.working_directory() {
        println!("      directory: {}", dir.display());
    }
    if let Some(timeout) = executor.timeout_duration() {
        println!("      timeout: {timeout:?}");
    }
    if !executor.is_foreground() {
        println!("      background: true");
    }
}
