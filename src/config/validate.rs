// src/config/validate.rs

use std::path::{Path, PathBuf};

use crate::config::model::{PreRunCommand, RawWatchConfig, WatchConfig};
use crate::errors::{EscortError, Result};
use crate::types::parse_duration;

impl TryFrom<RawWatchConfig> for WatchConfig {
    type Error = EscortError;

    fn try_from(raw: RawWatchConfig) -> std::result::Result<Self, Self::Error> {
        let root = resolve_root(&raw.root)?;
        validate_compiler(&raw.compiler)?;

        let delay = parse_duration(&raw.delay)
            .map_err(|e| EscortError::ConfigError(format!("invalid delay '{}': {e}", raw.delay)))?;

        let pre_run = raw
            .pre_run
            .iter()
            .filter_map(|line| PreRunCommand::parse(line))
            .collect();

        Ok(WatchConfig::new_unchecked(
            root,
            raw.target,
            raw.compiler,
            raw.extensions,
            raw.exclude_dirs,
            raw.exclude_files,
            delay,
            pre_run,
            raw.args,
        ))
    }
}

/// Resolve `root` to an absolute, canonical, existing directory.
fn resolve_root(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    let canonical = path.canonicalize().map_err(|e| {
        EscortError::ConfigError(format!("cannot resolve root '{root}': {e}"))
    })?;

    if !canonical.is_dir() {
        return Err(EscortError::ConfigError(format!(
            "root '{}' is not a directory",
            canonical.display()
        )));
    }

    Ok(canonical)
}

fn validate_compiler(compiler: &str) -> Result<()> {
    if compiler.trim().is_empty() {
        return Err(EscortError::ConfigError(
            "compiler must not be empty".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn raw_with_root(root: &Path) -> RawWatchConfig {
        RawWatchConfig {
            root: root.to_string_lossy().into_owned(),
            ..RawWatchConfig::default()
        }
    }

    #[test]
    fn root_is_made_absolute() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = WatchConfig::try_from(raw_with_root(dir.path())).unwrap();
        assert!(cfg.root().is_absolute());
        assert_eq!(cfg.root(), dir.path().canonicalize().unwrap());
        assert_eq!(cfg.delay(), Duration::from_secs(1));
    }

    #[test]
    fn missing_root_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("nope");
        match WatchConfig::try_from(raw_with_root(&gone)) {
            Err(EscortError::ConfigError(msg)) => assert!(msg.contains("cannot resolve root")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn file_root_is_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        match WatchConfig::try_from(raw_with_root(file.path())) {
            Err(EscortError::ConfigError(msg)) => assert!(msg.contains("not a directory")),
            other => panic!("expected ConfigError, got {other:?}"),
        }
    }

    #[test]
    fn bad_delay_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let raw = RawWatchConfig {
            delay: "soon".to_string(),
            ..raw_with_root(dir.path())
        };
        assert!(matches!(
            WatchConfig::try_from(raw),
            Err(EscortError::ConfigError(_))
        ));
    }

    #[test]
    fn empty_compiler_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let raw = RawWatchConfig {
            compiler: "  ".to_string(),
            ..raw_with_root(dir.path())
        };
        assert!(matches!(
            WatchConfig::try_from(raw),
            Err(EscortError::ConfigError(_))
        ));
    }

    #[test]
    fn pre_run_lines_are_parsed_and_blank_ones_dropped() {
        let dir = tempfile::tempdir().unwrap();
        let raw = RawWatchConfig {
            pre_run: vec!["go vet ./...".to_string(), "   ".to_string()],
            ..raw_with_root(dir.path())
        };
        let cfg = WatchConfig::try_from(raw).unwrap();
        assert_eq!(cfg.pre_run().len(), 1);
        assert_eq!(cfg.pre_run()[0].program, "go");
    }
}
