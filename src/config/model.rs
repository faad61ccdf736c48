// src/config/model.rs

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Configuration as read from an optional TOML file and CLI flags, before
/// validation.
///
/// ```toml
/// root = "."
/// target = "./cmd/server"
/// extensions = ["go", "tmpl"]
/// exclude_dirs = ["vendor", "node_modules"]
/// delay = "500ms"
/// pre_run = ["go generate ./..."]
/// args = ["--port", "8080"]
/// ```
///
/// Every key is optional and falls back to the built-in default.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawWatchConfig {
    /// Directory tree to watch. All watched paths live under it.
    #[serde(default = "default_root")]
    pub root: String,

    /// Build target handed to the compiler.
    #[serde(default = "default_target")]
    pub target: String,

    /// Compiler program, invoked as `<compiler> build -o <out> <target>`.
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// File extensions (without the dot) that count as relevant changes.
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Directory names whose whole subtree is never watched.
    #[serde(default = "default_exclude_dirs")]
    pub exclude_dirs: Vec<String>,

    /// File names that never produce a trigger.
    #[serde(default)]
    pub exclude_files: Vec<String>,

    /// Quiet window, e.g. `"1s"` or `"250ms"`.
    #[serde(default = "default_delay")]
    pub delay: String,

    /// Command lines run before every build.
    #[serde(default)]
    pub pre_run: Vec<String>,

    /// Arguments passed to every child generation.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_root() -> String {
    ".".to_string()
}

fn default_target() -> String {
    ".".to_string()
}

fn default_compiler() -> String {
    "go".to_string()
}

fn default_extensions() -> Vec<String> {
    ["go", "tmpl", "tpl", "html"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_exclude_dirs() -> Vec<String> {
    ["assets", "tmp", "vendor", "node_modules"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_delay() -> String {
    "1s".to_string()
}

impl Default for RawWatchConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            target: default_target(),
            compiler: default_compiler(),
            extensions: default_extensions(),
            exclude_dirs: default_exclude_dirs(),
            exclude_files: Vec::new(),
            delay: default_delay(),
            pre_run: Vec::new(),
            args: Vec::new(),
        }
    }
}

/// A pre-run command line split into program and arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreRunCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl PreRunCommand {
    /// Split a command line on whitespace. Returns `None` for blank lines.
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace().map(String::from);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl fmt::Display for PreRunCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

/// Validated, immutable session configuration.
///
/// Construct it through `WatchConfig::try_from(RawWatchConfig)`, which
/// resolves `root` to an absolute directory and parses `delay`.
#[derive(Debug, Clone)]
pub struct WatchConfig {
    root: PathBuf,
    target: String,
    compiler: String,
    extensions: Vec<String>,
    exclude_dirs: Vec<String>,
    exclude_files: Vec<String>,
    delay: Duration,
    pre_run: Vec<PreRunCommand>,
    args: Vec<String>,
}

impl WatchConfig {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new_unchecked(
        root: PathBuf,
        target: String,
        compiler: String,
        extensions: Vec<String>,
        exclude_dirs: Vec<String>,
        exclude_files: Vec<String>,
        delay: Duration,
        pre_run: Vec<PreRunCommand>,
        args: Vec<String>,
    ) -> Self {
        Self {
            root,
            target,
            compiler,
            extensions,
            exclude_dirs,
            exclude_files,
            delay,
            pre_run,
            args,
        }
    }

    pub fn root(&self) -> &std::path::Path {
        &self.root
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    pub fn compiler(&self) -> &str {
        &self.compiler
    }

    pub fn extensions(&self) -> &[String] {
        &self.extensions
    }

    pub fn exclude_dirs(&self) -> &[String] {
        &self.exclude_dirs
    }

    pub fn exclude_files(&self) -> &[String] {
        &self.exclude_files
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    pub fn pre_run(&self) -> &[PreRunCommand] {
        &self.pre_run
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }
}
