// src/exec/relay.rs

//! Best-effort copy of a child's output streams to our own.

use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::task::JoinHandle;
use tracing::trace;

/// Produces a fresh writer for each child generation.
pub type SinkFactory = Arc<dyn Fn() -> Box<dyn AsyncWrite + Send + Unpin> + Send + Sync>;

/// Where relayed stdout/stderr end up.
#[derive(Clone)]
pub struct RelaySinks {
    pub stdout: SinkFactory,
    pub stderr: SinkFactory,
}

impl RelaySinks {
    pub fn new(stdout: SinkFactory, stderr: SinkFactory) -> Self {
        Self { stdout, stderr }
    }

    /// Our own process's stdout and stderr.
    pub fn inherit() -> Self {
        Self {
            stdout: Arc::new(|| Box::new(tokio::io::stdout())),
            stderr: Arc::new(|| Box::new(tokio::io::stderr())),
        }
    }
}

impl fmt::Debug for RelaySinks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelaySinks").finish_non_exhaustive()
    }
}

/// Copy `src` into `dst` until `src` closes. Copy errors end the relay
/// silently.
pub fn spawn_relay<R, W>(stream: &'static str, pid: Option<u32>, mut src: R, mut dst: W) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        match tokio::io::copy(&mut src, &mut dst).await {
            Ok(bytes) => trace!(stream, ?pid, bytes, "relay finished"),
            Err(err) => trace!(stream, ?pid, error = %err, "relay stopped"),
        }
        let _ = dst.flush().await;
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn copies_until_source_closes() {
        let (mut child_side, relay_src) = tokio::io::duplex(64);
        let (relay_dst, mut reader) = tokio::io::duplex(64);

        let handle = spawn_relay("stdout", Some(42), relay_src, relay_dst);

        child_side.write_all(b"hello\nworld\n").await.unwrap();
        drop(child_side);
        handle.await.unwrap();

        let mut out = String::new();
        tokio::io::AsyncReadExt::read_to_string(&mut reader, &mut out)
            .await
            .unwrap();
        assert_eq!(out, "hello\nworld\n");
    }

    #[tokio::test]
    async fn write_errors_end_the_relay_quietly() {
        let (mut child_side, relay_src) = tokio::io::duplex(64);
        let (relay_dst, reader) = tokio::io::duplex(64);
        drop(reader);

        let handle = spawn_relay("stderr", None, relay_src, relay_dst);
        let _ = child_side.write_all(b"nobody listens").await;
        drop(child_side);

        handle.await.unwrap();
    }
}
