// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Every watch/build flag is optional so that values from a `--config` file
//! are only overridden when the flag is actually given.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::RawWatchConfig;

/// Command-line arguments for `escort`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "escort",
    version,
    about = "Rebuild and restart a program whenever its sources change.",
    long_about = None,
    after_help = "Example:\n  escort --pre-run=\"command1 flag,command2 flag\"\n  Pre run specific commands before running the project"
)]
pub struct CliArgs {
    /// Optional TOML file providing the same keys as the flags below.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root path for watch; all files must be under root.
    #[arg(short = 'r', long, value_name = "DIR")]
    pub root: Option<String>,

    /// Target path for the build.
    #[arg(short = 't', long, value_name = "PATH")]
    pub target: Option<String>,

    /// Compiler program, invoked as `<compiler> build -o <out> <target>`.
    #[arg(long, value_name = "PROGRAM")]
    pub compiler: Option<String>,

    /// File extensions to watch (comma separated).
    #[arg(short = 'e', long, value_delimiter = ',', value_name = "EXT")]
    pub extensions: Vec<String>,

    /// Ignore these directories (comma separated).
    #[arg(short = 'D', long, value_delimiter = ',', value_name = "DIR")]
    pub exclude_dirs: Vec<String>,

    /// Ignore these files (comma separated).
    #[arg(short = 'F', long, value_delimiter = ',', value_name = "FILE")]
    pub exclude_files: Vec<String>,

    /// Delay before triggering a rebuild, e.g. `1s` or `250ms`.
    #[arg(short = 'd', long, value_name = "DURATION")]
    pub delay: Option<String>,

    /// Commands to run before every build (comma separated).
    #[arg(short = 'p', long, value_delimiter = ',', value_name = "CMD")]
    pub pre_run: Vec<String>,

    /// Arguments for the started program (comma separated).
    #[arg(short = 'a', long, value_delimiter = ',', value_name = "ARG", allow_hyphen_values = true)]
    pub args: Vec<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `ESCORT_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Resolve and print the configuration, but don't watch or build.
    #[arg(long)]
    pub dry_run: bool,
}

impl CliArgs {
    /// Overwrite fields of `raw` with every flag that was given.
    pub fn apply_overrides(&self, raw: &mut RawWatchConfig) {
        if let Some(root) = &self.root {
            raw.root = root.clone();
        }
        if let Some(target) = &self.target {
            raw.target = target.clone();
        }
        if let Some(compiler) = &self.compiler {
            raw.compiler = compiler.clone();
        }
        if let Some(delay) = &self.delay {
            raw.delay = delay.clone();
        }
        override_list(&mut raw.extensions, &self.extensions);
        override_list(&mut raw.exclude_dirs, &self.exclude_dirs);
        override_list(&mut raw.exclude_files, &self.exclude_files);
        override_list(&mut raw.pre_run, &self.pre_run);
        override_list(&mut raw.args, &self.args);
    }
}

fn override_list(dst: &mut Vec<String>, src: &[String]) {
    if !src.is_empty() {
        *dst = src.to_vec();
    }
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_lists_are_split() {
        let args = CliArgs::parse_from([
            "escort",
            "-e",
            "go,html",
            "--pre-run=go vet ./...,go generate",
            "-a",
            "--port,8080",
        ]);
        assert_eq!(args.extensions, vec!["go", "html"]);
        assert_eq!(args.pre_run, vec!["go vet ./...", "go generate"]);
        assert_eq!(args.args, vec!["--port", "8080"]);
    }

    #[test]
    fn only_given_flags_override() {
        let args = CliArgs::parse_from(["escort", "-d", "250ms", "-D", "dist"]);
        let mut raw = RawWatchConfig::default();
        args.apply_overrides(&mut raw);

        assert_eq!(raw.delay, "250ms");
        assert_eq!(raw.exclude_dirs, vec!["dist"]);
        assert_eq!(raw.extensions, vec!["go", "tmpl", "tpl", "html"]);
        assert_eq!(raw.root, ".");
    }
}
