#![allow(dead_code)]

use std::path::Path;

use escort::config::{RawWatchConfig, WatchConfig};

/// Builder for `WatchConfig` to simplify test setup.
///
/// Starts from the built-in defaults with `root` pointing at an existing
/// directory (usually a `tempfile::tempdir()`).
pub struct WatchConfigBuilder {
    config: RawWatchConfig,
}

impl WatchConfigBuilder {
    pub fn new(root: &Path) -> Self {
        Self {
            config: RawWatchConfig {
                root: root.to_string_lossy().into_owned(),
                ..RawWatchConfig::default()
            },
        }
    }

    pub fn target(mut self, target: &str) -> Self {
        self.config.target = target.to_string();
        self
    }

    pub fn extensions(mut self, exts: &[&str]) -> Self {
        self.config.extensions = exts.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn exclude_dirs(mut self, dirs: &[&str]) -> Self {
        self.config.exclude_dirs = dirs.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn exclude_files(mut self, files: &[&str]) -> Self {
        self.config.exclude_files = files.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn delay(mut self, delay: &str) -> Self {
        self.config.delay = delay.to_string();
        self
    }

    pub fn pre_run(mut self, line: &str) -> Self {
        self.config.pre_run.push(line.to_string());
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.args.push(arg.to_string());
        self
    }

    pub fn raw(self) -> RawWatchConfig {
        self.config
    }

    pub fn build(self) -> WatchConfig {
        WatchConfig::try_from(self.config).expect("Failed to build valid config from builder")
    }
}
