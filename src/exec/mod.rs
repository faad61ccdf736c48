// src/exec/mod.rs

//! Process execution layer.
//!
//! Everything that touches external programs lives here:
//!
//! - [`backend`] provides the `Compiler` trait and the production
//!   `CommandCompiler` (`<compiler> build -o <out> <target>`). Tests swap in a
//!   fake compiler.
//! - [`hooks`] runs the user's pre-run commands before each build.
//! - [`build`] owns the single-flight `CompileState` and one build cycle.
//! - [`binary`] manages the temporary executable path for the session.
//! - [`terminate`] provides the per-platform `Terminator`.
//! - [`supervisor`] owns the single running child generation.
//! - [`relay`] copies a generation's stdout/stderr to our own streams.

pub mod backend;
pub mod binary;
pub mod build;
pub mod hooks;
pub mod relay;
pub mod supervisor;
pub mod terminate;

pub use backend::{CommandCompiler, CompileReport, Compiler};
pub use binary::TemporaryExecutable;
pub use build::{BuildRunner, CompileGuard, CompileState, CycleOutcome};
pub use hooks::PreRunHooks;
pub use relay::{RelaySinks, SinkFactory, spawn_relay};
pub use supervisor::ProcessSupervisor;
pub use terminate::{DirectKill, Terminator, TreeKill, platform_terminator};
