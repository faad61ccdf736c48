// src/errors.rs

//! Crate-wide error aliases and helpers.
//!
//! Only startup-fatal conditions travel through [`EscortError`]. Everything
//! that can go wrong once the loops are running is logged where it happens.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum EscortError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("File watcher error: {0}")]
    WatchError(#[from] notify::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, EscortError>;
