// src/engine/session.rs

use std::fmt;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::WatchConfig;
use crate::engine::debounce::DebounceGate;
use crate::engine::rebuild::{REQUEST_BUFFER, RebuildLoop};
use crate::engine::shutdown::{ShutdownCoordinator, ShutdownReport};
use crate::engine::TRIGGER_BUFFER;
use crate::errors::Result;
use crate::exec::{
    BuildRunner, CommandCompiler, CompileState, Compiler, PreRunHooks, ProcessSupervisor,
    RelaySinks, TemporaryExecutable, Terminator, platform_terminator,
};
use crate::fs::{FileSystem, RealFileSystem};
use crate::watch::{NotifySource, PathFilter, RawEvent, TreeWatcher, WatchSource};

/// Everything a session needs from the outside world.
///
/// Production builds these with [`Escort::from_config`]; tests assemble
/// them by hand with fakes.
pub struct SessionParts<S: WatchSource, C: Compiler> {
    pub config: WatchConfig,
    pub source: S,
    pub raw_events: mpsc::Receiver<RawEvent>,
    pub fs: Arc<dyn FileSystem>,
    pub compiler: C,
    pub terminator: Box<dyn Terminator>,
    pub sinks: RelaySinks,
    pub executable: TemporaryExecutable,
}

/// One watch-build-run session.
pub struct Escort<S: WatchSource, C: Compiler> {
    parts: SessionParts<S, C>,
    cancel: CancellationToken,
    initial_build: bool,
}

impl<S: WatchSource, C: Compiler> fmt::Debug for Escort<S, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Escort")
            .field("config", &self.parts.config)
            .field("executable", &self.parts.executable)
            .field("initial_build", &self.initial_build)
            .finish_non_exhaustive()
    }
}

impl Escort<NotifySource, CommandCompiler> {
    /// Set up the real notification source, compiler and temp executable.
    ///
    /// Errors here are startup-fatal.
    pub fn from_config(config: WatchConfig) -> Result<Self> {
        let (source, raw_events) = NotifySource::new()?;
        let executable = TemporaryExecutable::create()?;
        let compiler = CommandCompiler::new(config.compiler());

        Ok(Self::new(SessionParts {
            config,
            source,
            raw_events,
            fs: Arc::new(RealFileSystem),
            compiler,
            terminator: platform_terminator(),
            sinks: RelaySinks::inherit(),
            executable,
        }))
    }
}

impl<S: WatchSource, C: Compiler + 'static> Escort<S, C> {
    pub fn new(parts: SessionParts<S, C>) -> Self {
        Self {
            parts,
            cancel: CancellationToken::new(),
            initial_build: true,
        }
    }

    /// Cancelling this token ends the session.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Wait for the first change instead of building at startup.
    pub fn without_initial_build(mut self) -> Self {
        self.initial_build = false;
        self
    }

    /// Start the three loops and block until the session is cancelled and
    /// torn down.
    pub async fn run(self) -> ShutdownReport {
        let Self {
            parts,
            cancel,
            initial_build,
        } = self;
        let SessionParts {
            config,
            source,
            raw_events,
            fs,
            compiler,
            terminator,
            sinks,
            executable,
        } = parts;

        info!("Welcome to escort");
        debug!(?config, "session configuration");

        let (trigger_tx, trigger_rx) = mpsc::channel(TRIGGER_BUFFER);
        let (request_tx, request_rx) = mpsc::channel(REQUEST_BUFFER);
        let state = CompileState::new();

        let tree = TreeWatcher::new(
            config.root(),
            PathFilter::from_config(&config),
            fs,
            source,
            trigger_tx,
        );
        let gate = DebounceGate::new(config.delay(), trigger_rx, request_tx, state.clone());

        let runner = BuildRunner::new(
            compiler,
            PreRunHooks::new(config.pre_run().to_vec()),
            config.target(),
            executable.clone(),
            state,
        );
        let supervisor = ProcessSupervisor::new(config.args().to_vec(), terminator, sinks);
        let mut rebuild = RebuildLoop::new(runner, supervisor, request_rx);
        if !initial_build {
            rebuild = rebuild.without_initial_build();
        }

        let coordinator = ShutdownCoordinator::new(cancel.clone());
        let watch = tokio::spawn(tree.run(raw_events, cancel.clone()));
        let debounce = tokio::spawn(gate.run(cancel.clone()));
        let rebuild = tokio::spawn(rebuild.run(cancel.clone()));

        cancel.cancelled().await;
        coordinator.finish(watch, debounce, rebuild, &executable).await
    }
}
