// src/exec/deadline.rs

//! Per-invocation timeout guard.
//!
//! Arming a [`Deadline`] spawns a small guard task that waits for whichever
//! comes first:
//!
//! - the deadline instant, in which case it fires the `expired` signal that
//!   the wait step is listening on (the wait step then kills the child);
//! - the completion signal, sent once the wait step has resolved, in which
//!   case the guard exits without touching the process.
//!
//! The completion signal is a one-shot channel, so sending never blocks and
//! is harmless if the guard already finished. Dropping a `Deadline` sends it
//! too, so the timer never outlives the invocation on any exit path.

use std::time::Duration;

use tokio::sync::oneshot;
use tokio::time::{Instant, sleep_until};
use tracing::debug;

pub struct Deadline {
    timeout: Duration,
    expired: Option<oneshot::Receiver<()>>,
    fired: bool,
    done: Option<oneshot::Sender<()>>,
}

impl Deadline {
    /// Arm a deadline at `started_at + timeout`.
    ///
    /// `started_at` is the beginning of the invocation, not the moment the
    /// child finished spawning. Returns `None` when that instant is not
    /// representable (e.g. `Duration::MAX`); such a timeout can never elapse.
    pub fn arm(timeout: Duration, started_at: Instant) -> Option<Self> {
        let Some(deadline) = started_at.checked_add(timeout) else {
            debug!(?timeout, "timeout exceeds the clock range; not arming a deadline");
            return None;
        };
        let (expired_tx, expired_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<()>();

        tokio::spawn(async move {
            tokio::select! {
                _ = done_rx => {
                    debug!(?timeout, "deadline guard released before expiry");
                }
                _ = sleep_until(deadline) => {
                    debug!(?timeout, "deadline elapsed; signalling cancellation");
                    let _ = expired_tx.send(());
                }
            }
        });

        Some(Self {
            timeout,
            expired: Some(expired_rx),
            fired: false,
            done: Some(done_tx),
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Resolves once the deadline has elapsed.
    ///
    /// Never resolves if the guard was released first.
    pub async fn expired(&mut self) {
        if !self.fired {
            if let Some(rx) = self.expired.as_mut() {
                let fired = rx.await.is_ok();
                self.expired = None;
                self.fired = fired;
            }
        }
        if !self.fired {
            std::future::pending::<()>().await;
        }
    }

    /// Whether the deadline has been observed to elapse.
    pub fn has_fired(&self) -> bool {
        self.fired
    }

    /// Emit the completion signal and stop guarding.
    pub fn release(mut self) {
        self.signal_done();
    }

    fn signal_done(&mut self) {
        if let Some(done) = self.done.take() {
            // The guard may already have exited after firing.
            let _ = done.send(());
        }
    }
}

impl Drop for Deadline {
    fn drop(&mut self) {
        self.signal_done();
    }
}
