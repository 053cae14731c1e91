// src/exec/background.rs

//! Optional bookkeeping for background invocations.
//!
//! A background `run` detaches its wait-and-log task. Callers that need to
//! outlive those tasks (the CLI, before the runtime shuts down) can register
//! a [`Background`] with the executor and [`drain`](Background::drain) it.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::task::JoinHandle;
use tracing::{debug, warn};

#[derive(Clone, Default, Debug)]
pub struct Background {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Background {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn track(&self, handle: JoinHandle<()>) {
        let mut handles = self.lock();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Number of tracked invocations that have not finished yet.
    pub fn pending(&self) -> usize {
        self.lock().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait until every tracked invocation has finished, including ones
    /// registered while draining.
    pub async fn drain(&self) {
        loop {
            let batch: Vec<JoinHandle<()>> = std::mem::take(&mut *self.lock());
            if batch.is_empty() {
                break;
            }
            debug!(count = batch.len(), "waiting for background commands");
            for handle in batch {
                if let Err(e) = handle.await {
                    warn!(error = %e, "background command task did not complete");
                }
            }
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
