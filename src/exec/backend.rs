// src/exec/backend.rs

//! Pluggable compiler abstraction.
//!
//! The build runner talks to a `Compiler` instead of spawning processes
//! itself. Production uses [`CommandCompiler`]; tests provide a fake that
//! writes a script to the output path or reports a failure.

use std::future::Future;
use std::path::Path;
use std::pin::Pin;
use std::process::{Output, Stdio};

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::debug;

/// What one compiler invocation produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub success: bool,
    pub exit_code: Option<i32>,
    /// Combined stdout + stderr of the compiler.
    pub output: String,
}

impl CompileReport {
    pub fn from_output(out: &Output) -> Self {
        Self {
            success: out.status.success(),
            exit_code: out.status.code(),
            output: combined_output(out),
        }
    }
}

/// Trait abstracting how a build target is turned into an executable.
pub trait Compiler: Send + Sync {
    /// Build `target` into the executable at `output`.
    ///
    /// `Err` means the compiler could not be run at all; a compiler that ran
    /// and rejected the sources returns `Ok` with `success == false`.
    fn compile<'a>(
        &'a self,
        target: &'a str,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CompileReport>> + Send + 'a>>;
}

/// Runs `<program> build -o <output> <target>`.
#[derive(Debug, Clone)]
pub struct CommandCompiler {
    program: String,
}

impl CommandCompiler {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Compiler for CommandCompiler {
    fn compile<'a>(
        &'a self,
        target: &'a str,
        output: &'a Path,
    ) -> Pin<Box<dyn Future<Output = Result<CompileReport>> + Send + 'a>> {
        Box::pin(async move {
            debug!(compiler = %self.program, target, output = %output.display(), "invoking compiler");

            let out = Command::new(&self.program)
                .arg("build")
                .arg("-o")
                .arg(output)
                .arg(target)
                .stdin(Stdio::null())
                .kill_on_drop(true)
                .output()
                .await
                .with_context(|| format!("running '{} build' for {}", self.program, target))?;

            Ok(CompileReport::from_output(&out))
        })
    }
}

/// Stdout followed by stderr, lossily decoded.
pub fn combined_output(out: &Output) -> String {
    let mut text = String::from_utf8_lossy(&out.stdout).into_owned();
    text.push_str(&String::from_utf8_lossy(&out.stderr));
    text
}
