use std::io::Write;
use std::time::Duration;

use clap::Parser;
use tempfile::NamedTempFile;

use escort::cli::CliArgs;
use escort::config::loader::load_or_default;
use escort::config::{WatchConfig, load_and_validate};
use escort::errors::EscortError;
use escort_test_utils::builders::WatchConfigBuilder;

fn config_file(body: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{body}").unwrap();
    file
}

#[test]
fn file_values_are_overridden_by_flags() {
    let root = tempfile::tempdir().unwrap();
    let root_str = root.path().to_string_lossy().replace('\\', "/");
    let file = config_file(&format!(
        r#"
root = "{root_str}"
target = "./cmd/server"
extensions = ["go"]
delay = "250ms"
pre_run = ["go generate ./..."]
"#
    ));

    let args = CliArgs::parse_from([
        "escort",
        "--config",
        file.path().to_str().unwrap(),
        "-d",
        "2s",
        "-a",
        "-v,--port=8080",
    ]);
    let mut raw = load_or_default(args.config.as_ref()).unwrap();
    args.apply_overrides(&mut raw);
    let cfg = WatchConfig::try_from(raw).unwrap();

    assert_eq!(cfg.root(), root.path().canonicalize().unwrap());
    assert_eq!(cfg.target(), "./cmd/server");
    assert_eq!(cfg.extensions(), ["go"]);
    assert_eq!(cfg.delay(), Duration::from_secs(2));
    assert_eq!(cfg.args(), ["-v", "--port=8080"]);
    assert_eq!(cfg.pre_run().len(), 1);
    assert_eq!(cfg.pre_run()[0].program, "go");
    assert_eq!(cfg.compiler(), "go");
}

#[test]
fn unknown_keys_are_rejected() {
    let file = config_file("extentions = [\"go\"]\n");
    let err = load_and_validate(file.path()).unwrap_err();
    assert!(matches!(err, EscortError::TomlError(_)), "got {err:?}");
}

#[test]
fn missing_root_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let raw = WatchConfigBuilder::new(&dir.path().join("gone")).raw();
    let err = WatchConfig::try_from(raw).unwrap_err();
    assert!(matches!(err, EscortError::ConfigError(_)), "got {err:?}");
}

#[test]
fn bad_delay_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let raw = WatchConfigBuilder::new(dir.path()).delay("soon").raw();
    let err = WatchConfig::try_from(raw).unwrap_err();
    assert!(err.to_string().contains("invalid delay"), "got {err}");
}

#[tokio::test]
async fn startup_errors_come_back_typed() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("gone");
    let args = CliArgs::parse_from(["escort", "--dry-run", "-r", missing.to_str().unwrap()]);

    let err = escort::run(args).await.unwrap_err();
    assert!(matches!(err, EscortError::ConfigError(_)), "got {err:?}");
}
