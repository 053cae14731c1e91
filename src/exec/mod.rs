// src/exec/mod.rs

//! Process execution layer.
//!
//! This module launches external programs with `tokio::process::Command`,
//! streams their output into caller-supplied sinks, enforces optional
//! timeouts, and logs one completion record per invocation.
//!
//! - [`executor`] owns the [`Executor`] and its `run` operation.
//! - [`sink`] provides [`Sink`] destinations and the [`SharedBuffer`] used for
//!   capture.
//! - [`fanout`] duplicates a stream into several writers.
//! - [`pump`] copies a child pipe into a writer on its own task.
//! - [`deadline`] is the per-invocation timeout guard.
//! - [`outcome`] holds [`RunOutput`] and the completion log.
//! - [`background`] lets callers await detached background invocations.
//! - [`runner`] defines the [`Runner`] abstraction.

pub mod background;
pub mod deadline;
pub mod executor;
pub mod fanout;
pub mod outcome;
pub mod pump;
pub mod runner;
pub mod sink;

pub use background::Background;
pub use executor::Executor;
pub use fanout::FanOut;
pub use outcome::{EXIT_LOG_TARGET, InvocationLog, RunOutput};
pub use pump::Stream;
pub use runner::{RunFuture, Runner, runner_fn};
pub use sink::{SharedBuffer, Sink};
