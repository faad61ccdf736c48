// src/engine/debounce.rs

//! Trailing-edge debounce between the tree watcher and the rebuild loop.
//!
//! Every trigger restarts the full quiet window. A rebuild request is only
//! emitted once the window elapses with no new trigger, so N triggers that
//! arrive within `delay` of each other yield exactly one request, timed from
//! the last of them.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace};

use crate::engine::{RebuildRequest, Trigger};
use crate::exec::CompileState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    Idle,
    TimerArmed,
}

#[derive(Debug)]
pub struct DebounceGate {
    delay: Duration,
    state: GateState,
    trigger_rx: mpsc::Receiver<Trigger>,
    request_tx: mpsc::Sender<RebuildRequest>,
    compile_state: CompileState,
    fired: u64,
}

impl DebounceGate {
    pub fn new(
        delay: Duration,
        trigger_rx: mpsc::Receiver<Trigger>,
        request_tx: mpsc::Sender<RebuildRequest>,
        compile_state: CompileState,
    ) -> Self {
        Self {
            delay,
            state: GateState::Idle,
            trigger_rx,
            request_tx,
            compile_state,
            fired: 0,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is checked before the timer on every wakeup, so a timer
    /// that expires concurrently with cancellation never fires.
    pub async fn run(mut self, cancel: CancellationToken) {
        let timer = sleep(self.delay);
        tokio::pin!(timer);
        let mut triggers_open = true;

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => {
                    if self.state == GateState::TimerArmed {
                        debug!("discarding pending rebuild timer on shutdown");
                    }
                    break;
                }

                trigger = self.trigger_rx.recv(), if triggers_open => match trigger {
                    Some(trigger) => {
                        timer.as_mut().reset(Instant::now() + self.delay);
                        match self.state {
                            GateState::Idle => trace!(path = %trigger.path().display(), "arming rebuild timer"),
                            GateState::TimerArmed => trace!(path = %trigger.path().display(), "restarting rebuild timer"),
                        }
                        self.state = GateState::TimerArmed;
                    }
                    None => {
                        debug!("trigger channel closed");
                        triggers_open = false;
                    }
                },

                () = &mut timer, if self.state == GateState::TimerArmed => {
                    self.state = GateState::Idle;
                    self.fire();
                }
            }
        }

        debug!(fired = self.fired, "debounce loop finished");
    }

    fn fire(&mut self) {
        if self.compile_state.is_compiling() {
            info!("build in progress; change dropped");
            return;
        }

        self.fired += 1;
        let request = RebuildRequest {
            seq: self.fired,
            fired_at: Instant::now(),
        };

        match self.request_tx.try_send(request) {
            Ok(()) => debug!(seq = request.seq, "rebuild requested"),
            Err(TrySendError::Full(_)) => debug!("rebuild already pending; change dropped"),
            Err(TrySendError::Closed(_)) => debug!("rebuild loop is gone; change dropped"),
        }
    }
}
