// src/exec/binary.rs

//! The session's temporary executable.
//!
//! One stable path is created at startup and reused for every generation.
//! The compiler writes into a sibling staging path; the staging file is
//! renamed over the stable path only after the previous generation is gone,
//! so a failed build never touches the binary that is currently running.

use std::env::consts::EXE_SUFFIX;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::errors::Result;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemporaryExecutable {
    path: PathBuf,
    staging: PathBuf,
}

impl TemporaryExecutable {
    /// Create a fresh, empty file in the system temp dir.
    ///
    /// Failure here is fatal for the session.
    pub fn create() -> Result<Self> {
        let file = tempfile::Builder::new()
            .prefix("escort-")
            .suffix(EXE_SUFFIX)
            .tempfile()?;
        let (_file, path) = file.keep().map_err(|e| e.error)?;
        debug!(path = %path.display(), "created temporary executable");
        Ok(Self::at(path))
    }

    /// Use an explicit location; the staging path is derived from it.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "escort".to_string());
        let staging = path.with_file_name(format!("{stem}-next{EXE_SUFFIX}"));
        Self { path, staging }
    }

    /// Where every generation is started from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where the compiler writes its output.
    pub fn staging_path(&self) -> &Path {
        &self.staging
    }

    /// Move a freshly built staging file over the stable path.
    pub fn promote(&self) -> io::Result<()> {
        fs::rename(&self.staging, &self.path)
    }

    /// Delete the stable path and any leftover staging file.
    pub fn remove(&self) -> io::Result<()> {
        match fs::remove_file(&self.staging) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
        fs::remove_file(&self.path)
    }
}
