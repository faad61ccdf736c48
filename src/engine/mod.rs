// src/engine/mod.rs

//! Orchestration engine for escort.
//!
//! Three long-lived loops talk to each other only through bounded channels:
//!
//! ```text
//! TreeWatcher --Trigger--> DebounceGate --RebuildRequest--> RebuildLoop
//! ```
//!
//! - [`debounce`] turns bursts of triggers into one request per quiet period.
//! - [`rebuild`] owns the build runner and the process supervisor.
//! - [`shutdown`] owns cancellation and the final, ordered teardown.
//! - [`session`] wires everything together.

use std::path::{Path, PathBuf};

use tokio::time::Instant;

pub mod debounce;
pub mod rebuild;
pub mod session;
pub mod shutdown;

pub use debounce::{DebounceGate, GateState};
pub use rebuild::RebuildLoop;
pub use session::{Escort, SessionParts};
pub use shutdown::{ShutdownCoordinator, ShutdownReport, ShutdownState};

/// Capacity of the watcher -> debounce channel.
pub const TRIGGER_BUFFER: usize = 64;

/// "Something relevant changed."
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    path: PathBuf,
}

impl Trigger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The path whose change produced this trigger. Informational only.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Emitted by the debounce gate once a quiet period has elapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RebuildRequest {
    /// Monotonic counter of fired requests, starting at 1.
    pub seq: u64,
    pub fired_at: Instant,
}
