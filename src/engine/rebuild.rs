// src/engine/rebuild.rs

use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::engine::RebuildRequest;
use crate::exec::{BuildRunner, Compiler, CycleOutcome, ProcessSupervisor};

/// Capacity of the debounce -> rebuild channel. One pending request is
/// enough: anything more would be the same rebuild.
pub const REQUEST_BUFFER: usize = 1;

/// Serializes build cycles and owns the process supervisor for the session.
///
/// A build that is running when cancellation arrives is allowed to finish;
/// [`BuildRunner::run_cycle`] then skips the restart.
pub struct RebuildLoop<C: Compiler> {
    runner: BuildRunner<C>,
    supervisor: ProcessSupervisor,
    request_rx: mpsc::Receiver<RebuildRequest>,
    initial_build: bool,
}

impl<C: Compiler> fmt::Debug for RebuildLoop<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RebuildLoop")
            .field("supervisor", &self.supervisor)
            .field("initial_build", &self.initial_build)
            .finish_non_exhaustive()
    }
}

impl<C: Compiler> RebuildLoop<C> {
    pub fn new(
        runner: BuildRunner<C>,
        supervisor: ProcessSupervisor,
        request_rx: mpsc::Receiver<RebuildRequest>,
    ) -> Self {
        Self {
            runner,
            supervisor,
            request_rx,
            initial_build: true,
        }
    }

    /// Only build on requests, not once at startup.
    pub fn without_initial_build(mut self) -> Self {
        self.initial_build = false;
        self
    }

    /// Run until cancelled, then hand the supervisor back so the caller can
    /// stop whatever generation is still running.
    pub async fn run(mut self, cancel: CancellationToken) -> ProcessSupervisor {
        if self.initial_build && !cancel.is_cancelled() {
            self.cycle(&cancel, None).await;
        }

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                request = self.request_rx.recv() => match request {
                    Some(request) => self.cycle(&cancel, Some(request)).await,
                    None => {
                        debug!("rebuild request channel closed");
                        cancel.cancelled().await;
                        break;
                    }
                },
            }
        }

        debug!("rebuild loop finished");
        self.supervisor
    }

    async fn cycle(&mut self, cancel: &CancellationToken, request: Option<RebuildRequest>) {
        if let Some(request) = request {
            debug!(
                seq = request.seq,
                waited = ?request.fired_at.elapsed(),
                "starting rebuild"
            );
        }

        match self.runner.run_cycle(&mut self.supervisor, cancel).await {
            CycleOutcome::Started { pid } => debug!(?pid, "generation started"),
            CycleOutcome::Built => info!("build finished during shutdown"),
            outcome => debug!(?outcome, "cycle ended without a new generation"),
        }
    }
}
