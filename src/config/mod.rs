// src/config/mod.rs

//! Configuration loading and validation for escort.
//!
//! Responsibilities:
//! - Define the TOML/CLI-backed raw model and the validated `WatchConfig`
//!   (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Validate invariants like "root is an existing directory" (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path};
pub use model::{PreRunCommand, RawWatchConfig, WatchConfig};
