// src/exec/pump.rs

//! Copy a child's piped output into its configured writer.

use std::fmt;
use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::exec::fanout::FanOut;

const PUMP_BUFFER_SIZE: usize = 8 * 1024;

/// Which standard stream of the child a pump is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

impl fmt::Display for Stream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stream::Stdout => f.write_str("stdout"),
            Stream::Stderr => f.write_str("stderr"),
        }
    }
}

/// Spawn a task that reads `reader` until EOF and writes every chunk to
/// every target of `writer`.
///
/// If the writer fails, the pipe is still drained to EOF so the child never
/// blocks on a full pipe; the first write error is returned once the stream
/// ends. On success the number of bytes copied is returned.
pub fn spawn_pump<R>(stream: Stream, mut reader: R, writer: FanOut) -> JoinHandle<io::Result<u64>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut buf = vec![0u8; PUMP_BUFFER_SIZE];
        let mut copied: u64 = 0;
        let mut failure: Option<io::Error> = None;

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            copied += n as u64;

            if failure.is_some() {
                continue;
            }
            if let Err(e) = writer.write_all(&buf[..n]).await {
                warn!(%stream, error = %e, "writer rejected child output; draining remainder");
                failure = Some(e);
            }
        }

        if failure.is_none() {
            if let Err(e) = writer.flush().await {
                failure = Some(e);
            }
        }

        trace!(%stream, copied, "pump reached EOF");

        match failure {
            Some(e) => Err(e),
            None => Ok(copied),
        }
    })
}
