//! In-process stand-ins for the notification source, the compiler and the
//! relay sinks.

use std::collections::VecDeque;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use escort::exec::{CompileReport, Compiler, RelaySinks};
use escort::watch::WatchSource;
use tokio::io::AsyncWrite;
use tokio::sync::Notify;

#[derive(Debug, Default)]
pub struct FakeSourceState {
    pub watched: Vec<PathBuf>,
    pub unwatched: Vec<PathBuf>,
    pub close_calls: usize,
    pub closed: bool,
}

/// Records registrations; clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct FakeWatchSource {
    state: Arc<Mutex<FakeSourceState>>,
}

impl FakeWatchSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watched(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().watched.clone()
    }

    pub fn unwatched(&self) -> Vec<PathBuf> {
        self.state.lock().unwrap().unwatched.clone()
    }

    pub fn close_calls(&self) -> usize {
        self.state.lock().unwrap().close_calls
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

impl WatchSource for FakeWatchSource {
    fn watch(&mut self, path: &Path) -> notify::Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.closed {
            return Err(notify::Error::generic("closed"));
        }
        state.watched.push(path.to_path_buf());
        Ok(())
    }

    fn unwatch(&mut self, path: &Path) -> notify::Result<()> {
        let mut state = self.state.lock().unwrap();
        state.unwatched.push(path.to_path_buf());
        Ok(())
    }

    fn close(&mut self) -> bool {
        let mut state = self.state.lock().unwrap();
        state.close_calls += 1;
        !std::mem::replace(&mut state.closed, true)
    }
}

/// What the next compile should do.
#[derive(Debug, Clone)]
pub enum FakeBuild {
    /// Write a `/bin/sh` script with this body to the output path.
    Succeed(String),
    /// Report a non-zero compiler exit with this output.
    Fail(String),
}

/// Scripted compiler. When the script runs out, every build succeeds with
/// a long-running program.
#[derive(Debug, Clone, Default)]
pub struct FakeCompiler {
    script: Arc<Mutex<VecDeque<FakeBuild>>>,
    calls: Arc<AtomicUsize>,
    started: Arc<Notify>,
    gate: Option<Arc<Notify>>,
}

impl FakeCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn then(self, build: FakeBuild) -> Self {
        self.script.lock().unwrap().push_back(build);
        self
    }

    /// Every compile waits for one `notify_one` on the returned handle.
    pub fn gated(mut self) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gate = Some(Arc::clone(&gate));
        (self, gate)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Notified each time a compile starts.
    pub fn started(&self) -> Arc<Notify> {
        Arc::clone(&self.started)
    }
}

impl Compiler for FakeCompiler {
    fn compile<'a>(
        &'a self,
        _target: &'a str,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = anyhow::Result<CompileReport>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.started.notify_one();
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }

            let next = self.script.lock().unwrap().pop_front();
            match next.unwrap_or_else(|| FakeBuild::Succeed("exec sleep 30".into())) {
                FakeBuild::Succeed(body) => {
                    write_script(output, &body)?;
                    Ok(CompileReport {
                        success: true,
                        exit_code: Some(0),
                        output: String::new(),
                    })
                }
                FakeBuild::Fail(out) => Ok(CompileReport {
                    success: false,
                    exit_code: Some(2),
                    output: out,
                }),
            }
        })
    }
}

fn write_script(path: &Path, body: &str) -> io::Result<()> {
    std::fs::write(path, format!("#!/bin/sh\n{body}\n"))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(())
}

/// In-memory writer for relayed output.
#[derive(Debug, Clone, Default)]
pub struct SharedBuf {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuf {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl AsyncWrite for SharedBuf {
    fn poll_write(self: Pin<&mut Self>, _cx: &mut Context<'_>, buf: &[u8]) -> Poll<io::Result<usize>> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

/// Sinks that append every generation's output to `stdout` / `stderr`.
pub fn capture_sinks(stdout: &SharedBuf, stderr: &SharedBuf) -> RelaySinks {
    let out = stdout.clone();
    let err = stderr.clone();
    RelaySinks::new(
        Arc::new(move || Box::new(out.clone())),
        Arc::new(move || Box::new(err.clone())),
    )
}
