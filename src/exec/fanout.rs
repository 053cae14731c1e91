// src/exec/fanout.rs

//! Composite writer that duplicates every write to several sinks.

use std::io;

use crate::exec::sink::Sink;

/// Writes each buffer to all targets, in insertion order.
///
/// A write succeeds only if every target accepted the whole buffer; the
/// first failing target's error is returned (prefixed with its label) and
/// later targets are skipped.
#[derive(Debug, Default, Clone)]
pub struct FanOut {
    targets: Vec<Sink>,
}

impl FanOut {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a target.
    pub fn with(mut self, target: impl Into<Sink>) -> Self {
        self.targets.push(target.into());
        self
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    pub async fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        for target in self.targets.iter() {
            target
                .write_all(buf)
                .await
                .map_err(|e| labelled(target, e))?;
        }
        Ok(())
    }

    pub async fn flush(&self) -> io::Result<()> {
        for target in self.targets.iter() {
            target.flush().await.map_err(|e| labelled(target, e))?;
        }
        Ok(())
    }
}

fn labelled(target: &Sink, err: io::Error) -> io::Error {
    io::Error::new(err.kind(), format!("sink '{}': {err}", target.label()))
}
