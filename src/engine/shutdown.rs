// src/engine/shutdown.rs

//! Process-wide cancellation and the ordered teardown that follows it.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::exec::{ProcessSupervisor, TemporaryExecutable};
use crate::watch::WatchSource;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    Running,
    Terminating,
    Stopped,
}

/// What the teardown actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    pub source_closed: bool,
    pub child_stopped: bool,
    pub executable_removed: bool,
}

/// Owns the session's cancellation token.
///
/// Teardown happens in [`ShutdownCoordinator::finish`], which consumes the
/// coordinator, so it can run only once no matter how many signals arrive.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    cancel: CancellationToken,
    state: ShutdownState,
}

impl ShutdownCoordinator {
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            state: ShutdownState::Running,
        }
    }

    pub fn token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> ShutdownState {
        match self.state {
            ShutdownState::Running if self.cancel.is_cancelled() => ShutdownState::Terminating,
            state => state,
        }
    }

    /// Wait for every loop to return, then stop the child, close the source
    /// and delete the executable, in that order.
    ///
    /// Cancels the token first in case no signal did.
    pub async fn finish<S: WatchSource>(
        mut self,
        watch: JoinHandle<S>,
        debounce: JoinHandle<()>,
        rebuild: JoinHandle<ProcessSupervisor>,
        executable: &TemporaryExecutable,
    ) -> ShutdownReport {
        self.cancel.cancel();
        self.state = ShutdownState::Terminating;
        debug!("waiting for loops to stop");

        let mut report = ShutdownReport::default();

        let source = watch
            .await
            .map_err(|err| error!("watch loop failed: {err}"))
            .ok();
        if let Err(err) = debounce.await {
            error!("debounce loop failed: {err}");
        }
        match rebuild.await {
            Ok(mut supervisor) => report.child_stopped = supervisor.shutdown().await,
            // The child handle was dropped with the task and killed on drop.
            Err(err) => error!("rebuild loop failed: {err}"),
        }

        if let Some(mut source) = source {
            report.source_closed = source.close();
        }

        match executable.remove() {
            Ok(()) => report.executable_removed = true,
            Err(err) => warn!("Failed to remove bin: {err}"),
        }

        self.state = ShutdownState::Stopped;
        info!("See you next time");
        report
    }
}

/// Cancel `cancel` on the first interrupt or terminate signal.
///
/// The task also ends when `cancel` fires for any other reason.
pub fn spawn_signal_listener(cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = wait_for_signal() => {}
        }
        info!("shutdown signal received");
        cancel.cancel();
    })
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    let mut term = match signal(SignalKind::terminate()) {
        Ok(term) => term,
        Err(err) => {
            warn!("cannot listen for SIGTERM: {err}");
            ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = ctrl_c() => {}
        _ = term.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    ctrl_c().await;
}

async fn ctrl_c() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for interrupt: {err}");
        std::future::pending::<()>().await;
    }
}
