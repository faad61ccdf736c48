// src/exec/build.rs

//! One build cycle: pre-run hooks, compile into staging, hand off to the
//! supervisor.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::exec::backend::Compiler;
use crate::exec::binary::TemporaryExecutable;
use crate::exec::hooks::PreRunHooks;
use crate::exec::supervisor::ProcessSupervisor;
use crate::types::format_latency;

/// The session-wide "build in progress" flag.
///
/// Cloned into the debounce gate, which only reads it. Only
/// [`CompileState::try_begin`] sets it.
#[derive(Debug, Clone, Default)]
pub struct CompileState {
    compiling: Arc<AtomicBool>,
}

impl CompileState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_compiling(&self) -> bool {
        self.compiling.load(Ordering::Acquire)
    }

    /// Set the flag if it is clear. The returned guard clears it on drop.
    pub fn try_begin(&self) -> Option<CompileGuard> {
        self.compiling
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CompileGuard {
                compiling: Arc::clone(&self.compiling),
            })
    }
}

#[derive(Debug)]
pub struct CompileGuard {
    compiling: Arc<AtomicBool>,
}

impl Drop for CompileGuard {
    fn drop(&mut self) {
        self.compiling.store(false, Ordering::Release);
    }
}

/// How a call to [`BuildRunner::run_cycle`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another build held the flag.
    Skipped,
    /// The compiler failed; the running generation was left alone.
    Failed,
    /// Build succeeded but shutdown was requested, so nothing was restarted.
    Built,
    Started { pid: Option<u32> },
    /// The old generation is gone and the new one could not be started.
    StartFailed,
}

pub struct BuildRunner<C: Compiler> {
    compiler: C,
    hooks: PreRunHooks,
    target: String,
    executable: TemporaryExecutable,
    state: CompileState,
}

impl<C: Compiler> BuildRunner<C> {
    pub fn new(
        compiler: C,
        hooks: PreRunHooks,
        target: impl Into<String>,
        executable: TemporaryExecutable,
        state: CompileState,
    ) -> Self {
        Self {
            compiler,
            hooks,
            target: target.into(),
            executable,
            state,
        }
    }

    pub fn state(&self) -> &CompileState {
        &self.state
    }

    pub fn executable(&self) -> &TemporaryExecutable {
        &self.executable
    }

    /// Run one full cycle against `supervisor`.
    ///
    /// Pre-run hooks run first, outside the compile flag. The flag is then
    /// held from the compile until the new generation is started, so a
    /// concurrent call is a no-op.
    pub async fn run_cycle(
        &self,
        supervisor: &mut ProcessSupervisor,
        cancel: &CancellationToken,
    ) -> CycleOutcome {
        if self.state.is_compiling() {
            debug!("build already in progress, skipping");
            return CycleOutcome::Skipped;
        }

        if !self.hooks.is_empty() {
            let failures = self.hooks.run_all().await;
            if failures > 0 {
                warn!(failures, "pre-run commands failed, building anyway");
            }
        }

        let Some(_guard) = self.state.try_begin() else {
            debug!("build started while pre-run commands ran, skipping");
            return CycleOutcome::Skipped;
        };

        if supervisor.has_generation() {
            info!("Recompiling...");
        } else {
            info!("Compiling...");
        }

        let start = Instant::now();
        let staging = self.executable.staging_path();
        match self.compiler.compile(&self.target, staging).await {
            Ok(report) if report.success => {}
            Ok(report) => {
                error!(
                    exit_code = ?report.exit_code,
                    "Failed to compile {}: {}",
                    self.target,
                    report.output.trim_end()
                );
                return CycleOutcome::Failed;
            }
            Err(err) => {
                error!("Failed to compile {}: {err:#}", self.target);
                return CycleOutcome::Failed;
            }
        }

        info!("Compile done in {:?}!", format_latency(start.elapsed()));

        if cancel.is_cancelled() {
            info!("shutdown requested, not restarting");
            return CycleOutcome::Built;
        }

        match supervisor.replace(&self.executable).await {
            Ok(pid) => CycleOutcome::Started { pid },
            Err(err) => {
                error!("Failed to start bin: {err:#}");
                CycleOutcome::StartFailed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_is_single_flight() {
        let state = CompileState::new();
        let observer = state.clone();

        let guard = state.try_begin().expect("flag was clear");
        assert!(observer.is_compiling());
        assert!(observer.try_begin().is_none());

        drop(guard);
        assert!(!observer.is_compiling());
        assert!(observer.try_begin().is_some());
    }
}
