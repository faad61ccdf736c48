// src/watch/tree.rs

//! Keeps the notification source registered for "root plus every
//! non-excluded descendant directory" and turns raw events into triggers.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::engine::Trigger;
use crate::fs::{EntryKind, FileSystem};
use crate::watch::event::{ChangeKind, classify};
use crate::watch::filter::{PathFilter, base_name};
use crate::watch::source::{RawEvent, WatchSource, is_watch_not_found};

pub struct TreeWatcher<S: WatchSource> {
    root: PathBuf,
    filter: PathFilter,
    fs: Arc<dyn FileSystem>,
    source: S,
    /// Directories currently registered with `source`.
    registry: BTreeSet<PathBuf>,
    trigger_tx: mpsc::Sender<Trigger>,
}

impl<S: WatchSource> std::fmt::Debug for TreeWatcher<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeWatcher")
            .field("root", &self.root)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl<S: WatchSource> TreeWatcher<S> {
    /// `root` must be absolute; every registered path is a descendant of it.
    pub fn new(
        root: impl Into<PathBuf>,
        filter: PathFilter,
        fs: Arc<dyn FileSystem>,
        source: S,
        trigger_tx: mpsc::Sender<Trigger>,
    ) -> Self {
        Self {
            root: root.into(),
            filter,
            fs,
            source,
            registry: BTreeSet::new(),
            trigger_tx,
        }
    }

    pub fn registry(&self) -> &BTreeSet<PathBuf> {
        &self.registry
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Walk the tree below `start` and register every directory that is not
    /// excluded. Excluded directories are skipped together with their whole
    /// subtree. Failures are logged per directory and never abort the walk.
    pub fn register_tree(&mut self, start: &Path) {
        let mut pending = vec![start.to_path_buf()];

        while let Some(dir) = pending.pop() {
            if !dir.starts_with(&self.root) {
                warn!(path = %dir.display(), "refusing to watch a path outside root");
                continue;
            }
            if dir != self.root && self.filter.is_excluded_dir(base_name(&dir)) {
                debug!(path = %dir.display(), "skipping excluded directory");
                continue;
            }

            match self.source.watch(&dir) {
                Ok(()) => {
                    debug!(path = %dir.display(), "Add to watch");
                    self.registry.insert(dir.clone());
                }
                Err(err) => {
                    warn!(path = %dir.display(), error = %err, "failed to watch directory");
                    continue;
                }
            }

            let entries = match self.fs.read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) => {
                    warn!(path = %dir.display(), error = %err, "failed to walk directory");
                    continue;
                }
            };

            // Reverse so the stack pops children in listing order.
            for entry in entries.into_iter().rev() {
                if self.fs.is_dir(&entry) {
                    pending.push(entry);
                }
            }
        }
    }

    /// Handle one item from the notification source.
    ///
    /// Returns the number of triggers emitted.
    pub fn handle_event(&mut self, raw: RawEvent) -> usize {
        let event = match raw {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, paths = ?err.paths, "file watcher error");
                return 0;
            }
        };

        trace!(?event, "raw event");

        let mut fired = 0;
        for (idx, path) in event.paths.iter().enumerate() {
            fired += match classify(&event.kind, idx) {
                ChangeKind::Ignored => 0,
                ChangeKind::Removed => {
                    self.deregister(path);
                    0
                }
                ChangeKind::Created => self.on_created(path),
                ChangeKind::Renamed => match self.fs.stat(path) {
                    Ok(EntryKind::Dir) => self.on_new_dir(path),
                    Ok(EntryKind::File | EntryKind::Symlink) => self.on_changed(path),
                    Err(_) => {
                        self.deregister(path);
                        0
                    }
                },
                ChangeKind::Changed => match self.fs.stat(path) {
                    Ok(_) => self.on_changed(path),
                    Err(err) => {
                        debug!(path = %path.display(), error = %err, "failed to get info; dropping event");
                        0
                    }
                },
            };
        }
        fired
    }

    /// Event loop: walk root, then react to raw events until cancelled.
    ///
    /// Hands the source back so shutdown can close it.
    pub async fn run(mut self, mut events: mpsc::Receiver<RawEvent>, cancel: CancellationToken) -> S {
        let root = self.root.clone();
        self.register_tree(&root);
        info!(root = %root.display(), directories = self.registry.len(), "watching for changes");

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                raw = events.recv() => match raw {
                    Some(raw) => {
                        self.handle_event(raw);
                    }
                    None => {
                        warn!("notification channel closed; no further changes will be seen");
                        cancel.cancelled().await;
                        break;
                    }
                },
            }
        }

        debug!("tree watcher loop finished");
        self.source
    }

    fn on_created(&mut self, path: &Path) -> usize {
        match self.fs.stat(path) {
            Ok(EntryKind::Dir) => self.on_new_dir(path),
            // Links are judged by their own name and never walked.
            Ok(EntryKind::File | EntryKind::Symlink) => self.on_changed(path),
            Err(err) => {
                debug!(path = %path.display(), error = %err, "failed to get info; dropping event");
                0
            }
        }
    }

    /// New directories are relevant whatever they contain.
    fn on_new_dir(&mut self, path: &Path) -> usize {
        if self.in_excluded_dir(path) || self.filter.is_excluded_dir(base_name(path)) {
            debug!(path = %path.display(), "new directory is excluded");
            return 0;
        }
        self.register_tree(path);
        self.fire(path)
    }

    fn on_changed(&mut self, path: &Path) -> usize {
        if self.in_excluded_dir(path) {
            return 0;
        }
        if self.filter.is_excluded_file(base_name(path)) {
            trace!(path = %path.display(), "excluded file");
            return 0;
        }
        if !self.filter.matches_extension(path) {
            trace!(path = %path.display(), "extension not watched");
            return 0;
        }
        self.fire(path)
    }

    /// True if any directory between root and `path` is excluded, or if
    /// `path` is not under root at all.
    fn in_excluded_dir(&self, path: &Path) -> bool {
        let Some(rel) = path.parent().and_then(|p| p.strip_prefix(&self.root).ok()) else {
            return true;
        };
        rel.components().any(|c| match c {
            Component::Normal(name) => self.filter.is_excluded_dir(&name.to_string_lossy()),
            _ => false,
        })
    }

    /// Best-effort removal of `path` (and any registered descendants).
    fn deregister(&mut self, path: &Path) {
        let mut doomed: Vec<PathBuf> = self
            .registry
            .iter()
            .filter(|p| p.starts_with(path))
            .cloned()
            .collect();
        if doomed.is_empty() {
            doomed.push(path.to_path_buf());
        }

        for p in doomed {
            self.registry.remove(&p);
            match self.source.unwatch(&p) {
                Ok(()) => debug!(path = %p.display(), "removed from watch"),
                // Expected when a whole subtree disappears at once.
                Err(err) if is_watch_not_found(&err) => {}
                Err(err) => {
                    warn!(path = %p.display(), error = %err, "failed to remove from watch")
                }
            }
        }
    }

    fn fire(&self, path: &Path) -> usize {
        debug!(path = %path.display(), "relevant change");
        match self.trigger_tx.try_send(Trigger::new(path)) {
            Ok(()) => 1,
            // A trigger is already waiting; the debounce window covers this one.
            Err(TrySendError::Full(_)) => 1,
            Err(TrySendError::Closed(_)) => {
                debug!("debounce gate is gone; dropping trigger");
                0
            }
        }
    }
}
