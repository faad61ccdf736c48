// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{RawWatchConfig, WatchConfig};
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw
/// `RawWatchConfig`.
///
/// This only performs TOML deserialization; it does **not** validate the
/// root directory or the delay. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawWatchConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;

    let config: RawWatchConfig = toml::from_str(&contents)?;

    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<WatchConfig> {
    let raw_config = load_from_path(&path)?;
    let config = WatchConfig::try_from(raw_config)?;
    Ok(config)
}

/// Load the raw config from `path` if one was given, otherwise start from
/// the built-in defaults.
pub fn load_or_default(path: Option<&PathBuf>) -> Result<RawWatchConfig> {
    match path {
        Some(path) => load_from_path(path),
        None => Ok(RawWatchConfig::default()),
    }
}
