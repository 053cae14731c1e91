// src/exec/sink.rs

//! Byte destinations for child process output.
//!
//! A [`Sink`] is what the caller hands to the executor as the "primary" or
//! "error" writer. It is cheap to clone and internally locked, because when
//! no separate error sink is configured both the stdout and the stderr pump
//! write into the same destination concurrently. Writes are async so the
//! pump tasks never block a runtime worker on a slow terminal or file.
//!
//! [`SharedBuffer`] is the in-memory destination used for output capture (and
//! handy in tests): every clone refers to the same bytes.

use std::fmt;
use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use tokio::io::{AsyncWrite, AsyncWriteExt};

type BoxedWriter = Box<dyn AsyncWrite + Send + Unpin>;

/// Cloneable, task-safe handle to an `AsyncWrite` destination.
#[derive(Clone)]
pub struct Sink {
    label: Arc<str>,
    inner: Arc<tokio::sync::Mutex<BoxedWriter>>,
}

impl Sink {
    /// Wrap an arbitrary async writer.
    pub fn new<W>(label: &str, writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            label: Arc::from(label),
            inner: Arc::new(tokio::sync::Mutex::new(Box::new(writer))),
        }
    }

    /// The current process's stdout.
    pub fn stdout() -> Self {
        Self::new("stdout", tokio::io::stdout())
    }

    /// The current process's stderr.
    pub fn stderr() -> Self {
        Self::new("stderr", tokio::io::stderr())
    }

    /// Discard everything.
    pub fn null() -> Self {
        Self::new("null", tokio::io::sink())
    }

    /// Append to a file, creating it if needed.
    ///
    /// The file is opened eagerly so a bad path is reported when the sink is
    /// built rather than on the first write.
    pub fn file(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::new(
            &path.display().to_string(),
            tokio::fs::File::from_std(file),
        ))
    }

    /// An in-memory sink plus a handle for reading back what was written.
    pub fn buffer() -> (Self, SharedBuffer) {
        let buffer = SharedBuffer::default();
        (Sink::from(buffer.clone()), buffer)
    }

    /// Name used in error messages: `stdout`, `null`, a file path, ...
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Write the whole chunk.
    ///
    /// The lock is held for the entire chunk, so two pumps sharing a sink
    /// never interleave inside a single read.
    pub async fn write_all(&self, buf: &[u8]) -> io::Result<()> {
        let mut writer = self.inner.lock().await;
        writer.write_all(buf).await
    }

    pub async fn flush(&self) -> io::Result<()> {
        let mut writer = self.inner.lock().await;
        writer.flush().await
    }
}

impl From<SharedBuffer> for Sink {
    fn from(buffer: SharedBuffer) -> Self {
        Sink::new("buffer", buffer)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink").field("label", &self.label).finish()
    }
}

/// Growable byte buffer shared between clones.
#[derive(Clone, Default, Debug)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    /// Copy of everything written so far.
    pub fn contents(&self) -> Vec<u8> {
        match self.bytes.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Everything written so far, decoded lossily as UTF-8.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.contents()).into_owned()
    }

    pub fn is_empty(&self) -> bool {
        self.contents().is_empty()
    }

    fn append(&self, buf: &[u8]) -> io::Result<()> {
        let mut guard = self
            .bytes
            .lock()
            .map_err(|_| io::Error::other("capture buffer lock poisoned"))?;
        guard.extend_from_slice(buf);
        Ok(())
    }
}

// Appending to memory never waits, so every poll completes immediately.
impl AsyncWrite for SharedBuffer {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Poll::Ready(self.append(buf).map(|()| buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
