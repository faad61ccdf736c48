// src/exec/supervisor.rs

//! Ownership of the single running child generation.
//!
//! At most one generation exists at a time. `replace` always finishes
//! terminating the old one before the binary on disk is swapped and the new
//! one is started.

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::exec::binary::TemporaryExecutable;
use crate::exec::relay::{RelaySinks, spawn_relay};
use crate::exec::terminate::Terminator;

/// How long relays may keep draining after their child is gone.
const RELAY_GRACE: Duration = Duration::from_millis(500);

/// One lifetime of the child process.
#[derive(Debug)]
pub struct ChildGeneration {
    id: u64,
    pid: Option<u32>,
    child: Child,
    relays: Vec<JoinHandle<()>>,
}

impl ChildGeneration {
    /// 1 for the first successful start of the session.
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pid(&self) -> Option<u32> {
        self.pid
    }
}

pub struct ProcessSupervisor {
    args: Vec<String>,
    terminator: Box<dyn Terminator>,
    sinks: RelaySinks,
    current: Option<ChildGeneration>,
    generations: u64,
}

impl std::fmt::Debug for ProcessSupervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessSupervisor")
            .field("args", &self.args)
            .field("terminator", &self.terminator.name())
            .field("current", &self.current)
            .field("generations", &self.generations)
            .finish()
    }
}

impl ProcessSupervisor {
    pub fn new(args: Vec<String>, terminator: Box<dyn Terminator>, sinks: RelaySinks) -> Self {
        Self {
            args,
            terminator,
            sinks,
            current: None,
            generations: 0,
        }
    }

    pub fn has_generation(&self) -> bool {
        self.current.is_some()
    }

    pub fn current_pid(&self) -> Option<u32> {
        self.current.as_ref().and_then(|g| g.pid)
    }

    pub fn generation(&self) -> Option<&ChildGeneration> {
        self.current.as_ref()
    }

    /// Number of generations started so far.
    pub fn generations_started(&self) -> u64 {
        self.generations
    }

    /// Stop the current generation, move the freshly built binary into place
    /// and start a new generation from it.
    ///
    /// Termination failures are logged and do not stop the hand-off. If the
    /// start fails the supervisor is left with no running generation.
    pub async fn replace(&mut self, exe: &TemporaryExecutable) -> Result<Option<u32>> {
        self.stop_current().await;

        exe.promote()
            .with_context(|| format!("moving new build into {}", exe.path().display()))?;

        self.start(exe)
    }

    /// Stop the current generation, if any. No restart follows.
    ///
    /// Returns `true` when a generation was running.
    pub async fn shutdown(&mut self) -> bool {
        self.stop_current().await
    }

    async fn stop_current(&mut self) -> bool {
        let Some(mut generation) = self.current.take() else {
            return false;
        };

        match generation.child.try_wait() {
            Ok(Some(status)) => {
                debug!(pid = ?generation.pid, %status, "previous process already exited");
            }
            _ => {
                info!("Killing old pid {}", display_pid(generation.pid));
                if let Err(err) = self.terminator.terminate(&mut generation.child).await {
                    error!(pid = ?generation.pid, "failed to stop process: {err:#}");
                }
            }
        }

        drain_relays(generation.relays).await;
        true
    }

    fn start(&mut self, exe: &TemporaryExecutable) -> Result<Option<u32>> {
        let mut child = Command::new(exe.path())
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("starting {}", exe.path().display()))?;

        let pid = child.id();
        let mut relays = Vec::with_capacity(2);
        match child.stdout.take() {
            Some(out) => relays.push(spawn_relay("stdout", pid, out, (self.sinks.stdout)())),
            None => warn!(pid = ?pid, "child stdout unavailable"),
        }
        match child.stderr.take() {
            Some(err) => relays.push(spawn_relay("stderr", pid, err, (self.sinks.stderr)())),
            None => warn!(pid = ?pid, "child stderr unavailable"),
        }

        self.generations += 1;
        info!("New pid is {}", display_pid(pid));
        self.current = Some(ChildGeneration {
            id: self.generations,
            pid,
            child,
            relays,
        });
        Ok(pid)
    }
}

async fn drain_relays(relays: Vec<JoinHandle<()>>) {
    for relay in relays {
        let abort = relay.abort_handle();
        if tokio::time::timeout(RELAY_GRACE, relay).await.is_err() {
            // A grandchild may still hold the pipe open.
            abort.abort();
        }
    }
}

fn display_pid(pid: Option<u32>) -> String {
    pid.map_or_else(|| "?".to_string(), |p| p.to_string())
}
