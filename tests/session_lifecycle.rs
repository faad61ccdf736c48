#![cfg(unix)]

use std::fs;
use std::sync::Arc;

use tokio::sync::mpsc;

use escort::engine::{Escort, SessionParts};
use escort::exec::{DirectKill, TemporaryExecutable};
use escort::fs::RealFileSystem;
use escort::watch::RAW_EVENT_BUFFER;
use escort_test_utils::builders::WatchConfigBuilder;
use escort_test_utils::events::{created, written};
use escort_test_utils::fakes::{FakeBuild, FakeCompiler, FakeWatchSource, SharedBuf, capture_sinks};
use escort_test_utils::{eventually, init_tracing, with_timeout};

struct Project {
    _dir: tempfile::TempDir,
    root: std::path::PathBuf,
    bin_dir: tempfile::TempDir,
}

fn project() -> Project {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().canonicalize().unwrap();
    fs::create_dir_all(root.join("pkg/api")).unwrap();
    fs::create_dir_all(root.join("vendor/lib")).unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join("main.go"), "package main").unwrap();
    Project {
        _dir: dir,
        root,
        bin_dir: tempfile::tempdir().unwrap(),
    }
}

#[tokio::test]
async fn change_rebuilds_and_shutdown_cleans_up() {
    init_tracing();
    let p = project();
    let config = WatchConfigBuilder::new(&p.root).delay("20ms").arg("--port=3000").build();
    let source = FakeWatchSource::new();
    let compiler = FakeCompiler::new()
        .then(FakeBuild::Succeed("echo \"gen1 $1\"; exec sleep 30".into()))
        .then(FakeBuild::Succeed("echo \"gen2 $1\"; exec sleep 30".into()));
    let stdout = SharedBuf::new();
    let executable = TemporaryExecutable::at(p.bin_dir.path().join("app"));
    let (raw_tx, raw_events) = mpsc::channel(RAW_EVENT_BUFFER);

    let session = Escort::new(SessionParts {
        config,
        source: source.clone(),
        raw_events,
        fs: Arc::new(RealFileSystem),
        compiler: compiler.clone(),
        terminator: Box::new(DirectKill),
        sinks: capture_sinks(&stdout, &SharedBuf::new()),
        executable: executable.clone(),
    });
    let cancel = session.cancel_token();
    let handle = tokio::spawn(session.run());

    // Initial build at startup.
    eventually(|| stdout.contents().contains("gen1 --port=3000")).await;

    eventually(|| source.watched().contains(&p.root.join("pkg/api"))).await;
    let watched = source.watched();
    assert!(watched.contains(&p.root));
    assert!(watched.contains(&p.root.join("pkg/api")));
    assert!(!watched.iter().any(|w| w.starts_with(p.root.join("vendor"))));
    assert!(!watched.iter().any(|w| w.starts_with(p.root.join(".git"))));

    raw_tx.send(written(&p.root.join("main.go"))).await.unwrap();
    eventually(|| stdout.contents().contains("gen2 --port=3000")).await;
    assert_eq!(compiler.calls(), 2);

    cancel.cancel();
    cancel.cancel();
    let report = with_timeout(handle).await.unwrap();

    assert!(report.child_stopped);
    assert!(report.source_closed);
    assert!(report.executable_removed);
    assert_eq!(source.close_calls(), 1);
    assert!(!executable.path().exists());

    // Nothing listens any more.
    assert!(raw_tx.send(written(&p.root.join("main.go"))).await.is_err());
    assert_eq!(compiler.calls(), 2);
}

#[tokio::test]
async fn new_directory_is_registered_and_triggers_rebuild() {
    init_tracing();
    let p = project();
    let config = WatchConfigBuilder::new(&p.root).delay("20ms").build();
    let source = FakeWatchSource::new();
    let compiler = FakeCompiler::new();
    let (raw_tx, raw_events) = mpsc::channel(RAW_EVENT_BUFFER);

    let session = Escort::new(SessionParts {
        config,
        source: source.clone(),
        raw_events,
        fs: Arc::new(RealFileSystem),
        compiler: compiler.clone(),
        terminator: Box::new(DirectKill),
        sinks: capture_sinks(&SharedBuf::new(), &SharedBuf::new()),
        executable: TemporaryExecutable::at(p.bin_dir.path().join("app")),
    })
    .without_initial_build();
    let cancel = session.cancel_token();
    let handle = tokio::spawn(session.run());

    eventually(|| source.watched().contains(&p.root)).await;
    assert_eq!(compiler.calls(), 0);

    let fresh = p.root.join("handlers");
    fs::create_dir_all(fresh.join("v1")).unwrap();
    raw_tx.send(created(&fresh)).await.unwrap();

    eventually(|| compiler.calls() == 1).await;
    let watched = source.watched();
    assert!(watched.contains(&fresh));
    assert!(watched.contains(&fresh.join("v1")));

    cancel.cancel();
    let report = with_timeout(handle).await.unwrap();
    assert!(report.source_closed);
}

#[tokio::test]
async fn failed_initial_build_still_cleans_up() {
    init_tracing();
    let p = project();
    let config = WatchConfigBuilder::new(&p.root).build();
    let source = FakeWatchSource::new();
    let compiler = FakeCompiler::new().then(FakeBuild::Fail("undefined: x".into()));
    let executable = TemporaryExecutable::at(p.bin_dir.path().join("app"));
    fs::write(executable.path(), b"").unwrap();
    let (_raw_tx, raw_events) = mpsc::channel(RAW_EVENT_BUFFER);

    let session = Escort::new(SessionParts {
        config,
        source: source.clone(),
        raw_events,
        fs: Arc::new(RealFileSystem),
        compiler: compiler.clone(),
        terminator: Box::new(DirectKill),
        sinks: capture_sinks(&SharedBuf::new(), &SharedBuf::new()),
        executable: executable.clone(),
    });
    let cancel = session.cancel_token();
    let handle = tokio::spawn(session.run());

    eventually(|| compiler.calls() == 1).await;
    cancel.cancel();
    let report = with_timeout(handle).await.unwrap();

    assert!(!report.child_stopped);
    assert!(report.source_closed);
    assert!(report.executable_removed);
    assert!(!executable.path().exists());
}
