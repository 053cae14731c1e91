// src/exec/runner.rs

//! Something that can be run to completion.
//!
//! [`Pipeline`](crate::pipeline::Pipeline) implements it; [`runner_fn`]
//! adapts a closure so callers and tests can plug in their own behaviour.

use std::future::Future;
use std::pin::Pin;

use crate::errors::Result;

pub type RunFuture<'a> = Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

pub trait Runner: Send + Sync {
    fn run(&self) -> RunFuture<'_>;
}

/// Closure-backed [`Runner`].
pub struct RunnerFn<F> {
    f: F,
}

/// Wrap `f` so that every `run()` call awaits a fresh future from it.
pub fn runner_fn<F, Fut>(f: F) -> RunnerFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    RunnerFn { f }
}

impl<F, Fut> Runner for RunnerFn<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    fn run(&self) -> RunFuture<'_> {
        Box::pin((self.f)())
    }
}
