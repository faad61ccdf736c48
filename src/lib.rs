// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod types;
pub mod watch;

use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::WatchConfig;
use crate::config::loader::load_or_default;
use crate::engine::Escort;
use crate::engine::shutdown::spawn_signal_listener;
use crate::errors::Result;

/// High-level entry point used by `main.rs`.
///
/// Errors returned from here are startup-fatal; once the session is running
/// every failure is logged and the function returns `Ok` after teardown.
///
/// This wires together:
/// - config loading (defaults, optional file, CLI flags)
/// - the watch/debounce/rebuild session
/// - Ctrl-C / SIGTERM handling
pub async fn run(args: CliArgs) -> Result<()> {
    let mut raw = load_or_default(args.config.as_ref())?;
    args.apply_overrides(&mut raw);
    let cfg = WatchConfig::try_from(raw)?;

    if args.dry_run {
        print_dry_run(&cfg);
        return Ok(());
    }

    let session = Escort::from_config(cfg)?;
    let _signals = spawn_signal_listener(session.cancel_token());

    let report = session.run().await;
    info!(
        source_closed = report.source_closed,
        child_stopped = report.child_stopped,
        executable_removed = report.executable_removed,
        "session ended"
    );
    Ok(())
}

/// Print the resolved configuration.
fn print_dry_run(cfg: &WatchConfig) {
    println!("escort dry-run");
    println!("  root = {}", cfg.root().display());
    println!("  target = {}", cfg.target());
    println!("  compiler = {}", cfg.compiler());
    println!("  extensions = {:?}", cfg.extensions());
    println!("  exclude_dirs = {:?}", cfg.exclude_dirs());
    println!("  exclude_files = {:?}", cfg.exclude_files());
    println!("  delay = {:?}", cfg.delay());

    if !cfg.pre_run().is_empty() {
        println!();
        println!("pre-run ({}):", cfg.pre_run().len());
        for command in cfg.pre_run() {
            println!("  - {command}");
        }
    }
    if !cfg.args().is_empty() {
        println!("args: {:?}", cfg.args());
    }

    debug!("dry-run complete (no execution)");
}
