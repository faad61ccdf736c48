// src/exec/terminate.rs

//! Platform-specific termination of a child generation.
//!
//! The implementation is picked once at startup by [`platform_terminator`]
//! instead of branching on the OS at each call site.

use std::future::Future;
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result, bail};
use tokio::process::{Child, Command};

pub trait Terminator: Send + Sync {
    /// Stop `child` and collect its exit status.
    fn terminate<'a>(
        &'a self,
        child: &'a mut Child,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>>;

    fn name(&self) -> &'static str;
}

/// Kill signal followed by a blocking wait, so no zombie is left behind.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectKill;

impl Terminator for DirectKill {
    fn terminate<'a>(
        &'a self,
        child: &'a mut Child,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move { child.kill().await.context("killing child process") })
    }

    fn name(&self) -> &'static str {
        "kill"
    }
}

/// Forceful recursive kill by pid (`TASKKILL /T /F /PID <pid>`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeKill;

impl Terminator for TreeKill {
    fn terminate<'a>(
        &'a self,
        child: &'a mut Child,
    ) -> Pin<Box<dyn Future<Output = Result<()>> + Send + 'a>> {
        Box::pin(async move {
            let Some(pid) = child.id() else {
                // Already reaped.
                return Ok(());
            };

            let status = Command::new("TASKKILL")
                .args(["/T", "/F", "/PID", &pid.to_string()])
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await
                .context("running TASKKILL")?;
            if !status.success() {
                bail!("TASKKILL exited with {status}");
            }

            child.wait().await.context("waiting for killed process")?;
            Ok(())
        })
    }

    fn name(&self) -> &'static str {
        "taskkill"
    }
}

/// Tree kill on Windows, direct kill everywhere else.
pub fn platform_terminator() -> Box<dyn Terminator> {
    if cfg!(windows) {
        Box::new(TreeKill)
    } else {
        Box::new(DirectKill)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn direct_kill_reaps_the_child() {
        let mut child = Command::new("sleep").arg("30").spawn().unwrap();
        DirectKill.terminate(&mut child).await.unwrap();
        let status = child.try_wait().unwrap().expect("child should be reaped");
        assert!(!status.success());
    }

    #[test]
    fn unix_uses_direct_kill() {
        assert_eq!(platform_terminator().name(), "kill");
    }
}
