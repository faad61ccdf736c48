// src/exec/hooks.rs

//! Pre-run commands executed sequentially before every build.
//!
//! They exist for their side effects (code generation, asset bundling).
//! Failures are logged and never stop the build.

use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::PreRunCommand;
use crate::exec::backend::combined_output;

#[derive(Debug, Clone, Default)]
pub struct PreRunHooks {
    commands: Vec<PreRunCommand>,
}

impl PreRunHooks {
    pub fn new(commands: Vec<PreRunCommand>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Run every command in order. Returns how many of them failed.
    pub async fn run_all(&self) -> usize {
        let mut failures = 0;
        for command in &self.commands {
            if !run_one(command).await {
                failures += 1;
            }
        }
        failures
    }
}

async fn run_one(command: &PreRunCommand) -> bool {
    match spawn_and_wait(command).await {
        Ok(out) if out.status.success() => {
            info!(command = %command, "Pre running {command}... {}", combined_output(&out).trim_end());
            true
        }
        Ok(out) => {
            warn!(
                command = %command,
                status = %out.status,
                "Pre running {command}... {}: {}",
                out.status,
                combined_output(&out).trim_end()
            );
            false
        }
        Err(err) => {
            warn!(command = %command, error = %err, "Pre running {command}... failed to start");
            false
        }
    }
}

async fn spawn_and_wait(command: &PreRunCommand) -> Result<std::process::Output> {
    Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .with_context(|| format!("running pre-run command '{command}'"))
}
